// ── Update polling ──
//
// Periodically re-fetches a versioned payload and compares its version with
// the one loaded at construction. The first difference is announced once on
// the schedule notifier and polling stops. A rejected session asks for a
// reload instead.

use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use portal_api::{Payload, RemoteDataLoader, Versioned};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::notifier::{Notifier, Notifiers, ReloadRequest, ScheduleUpdate};

/// Where the checker gets the current server-side version from.
pub trait UpdateSource: Send + Sync + 'static {
    fn current_version(&self) -> impl Future<Output = Result<String, portal_api::Error>> + Send;
}

/// Re-runs a loader and reports the version of the fresh snapshot.
pub struct LoaderUpdateSource<T: Payload + Versioned> {
    loader: Arc<RemoteDataLoader<T>>,
    auth_token: Option<SecretString>,
}

impl<T: Payload + Versioned> LoaderUpdateSource<T> {
    pub fn new(loader: Arc<RemoteDataLoader<T>>, auth_token: Option<SecretString>) -> Self {
        Self { loader, auth_token }
    }
}

impl<T: Payload + Versioned> UpdateSource for LoaderUpdateSource<T> {
    async fn current_version(&self) -> Result<String, portal_api::Error> {
        let data = match self.auth_token {
            Some(ref token) => {
                self.loader
                    .fetch(&[("authToken", token.expose_secret())])
                    .await?
            }
            None => self.loader.fetch(&[]).await?,
        };
        Ok(data.version().to_owned())
    }
}

/// The production source: the event payload.
pub type EventUpdateSource = LoaderUpdateSource<portal_api::EventData>;

/// Whether the host is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CheckerState {
    Active,
    Checking,
    /// An update was announced. Terminal.
    Notified,
    /// The session was rejected and a reload was requested. Terminal.
    ReloadRequested,
    /// Stopped by its owner. Terminal.
    Stopped,
}

impl CheckerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Notified | Self::ReloadRequested | Self::Stopped)
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    NoChange,
    Changed(ScheduleUpdate),
    ReloadRequested,
    /// Transient failure; the next interval tries again.
    Failed,
    /// The checker is in a terminal state and did not check.
    Skipped,
}

/// Detects server-side changes of a versioned payload.
///
/// Cheap to clone; clones share state.
pub struct PollingUpdateChecker<S: UpdateSource> {
    inner: Arc<CheckerInner<S>>,
}

impl<S: UpdateSource> Clone for PollingUpdateChecker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CheckerInner<S> {
    source: S,
    version: String,
    interval: Duration,
    state: RwLock<CheckerState>,
    last_check: Mutex<Instant>,
    checking: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    schedule: Arc<Notifier<ScheduleUpdate>>,
    reload: Arc<Notifier<ReloadRequest>>,
}

impl<S: UpdateSource> PollingUpdateChecker<S> {
    /// `version` is the version of the data currently loaded.
    pub fn new(
        source: S,
        version: impl Into<String>,
        interval: Duration,
        notifiers: &Notifiers,
    ) -> Self {
        Self {
            inner: Arc::new(CheckerInner {
                source,
                version: version.into(),
                interval,
                state: RwLock::new(CheckerState::Active),
                last_check: Mutex::new(Instant::now()),
                checking: tokio::sync::Mutex::new(()),
                cancel: CancellationToken::new(),
                schedule: Arc::clone(&notifiers.schedule),
                reload: Arc::clone(&notifiers.reload),
            }),
        }
    }

    pub fn state(&self) -> CheckerState {
        *self.inner.state.read().expect("checker state lock poisoned")
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Whether the polling timer has been cleared.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Stop polling for good.
    pub fn stop(&self) {
        self.set_state(CheckerState::Stopped);
        self.inner.cancel.cancel();
    }

    /// Whether a full interval has passed since the last check.
    fn is_due(&self) -> bool {
        self.inner
            .last_check
            .lock()
            .expect("checker clock lock poisoned")
            .elapsed()
            >= self.inner.interval
    }

    /// Check once, right now.
    pub async fn check_now(&self) -> CheckOutcome {
        let _guard = self.inner.checking.lock().await;
        if self.state().is_terminal() {
            return CheckOutcome::Skipped;
        }

        self.set_state(CheckerState::Checking);
        let result = self.inner.source.current_version().await;
        *self
            .inner
            .last_check
            .lock()
            .expect("checker clock lock poisoned") = Instant::now();

        match result {
            Ok(current) if current == self.inner.version => {
                debug!(version = %current, "no update");
                self.set_state(CheckerState::Active);
                CheckOutcome::NoChange
            }
            Ok(current) => {
                let update = ScheduleUpdate {
                    previous: self.inner.version.clone(),
                    current,
                };
                info!(from = %update.previous, to = %update.current, "schedule update available");
                self.set_state(CheckerState::Notified);
                self.inner.cancel.cancel();
                self.inner.schedule.notify(&update);
                CheckOutcome::Changed(update)
            }
            Err(e) if e.is_user_error() => {
                info!("update check rejected, requesting reload");
                self.set_state(CheckerState::ReloadRequested);
                self.inner.cancel.cancel();
                self.inner.reload.notify(&ReloadRequest {
                    reason: e.to_string(),
                });
                CheckOutcome::ReloadRequested
            }
            Err(e) => {
                // Already reported by the loader.
                debug!(
                    error = %e,
                    transient = e.is_transient(),
                    "update check failed, retrying next interval"
                );
                self.set_state(CheckerState::Active);
                CheckOutcome::Failed
            }
        }
    }

    /// Poll in the background until a terminal state is reached.
    ///
    /// While the host is hidden, timer ticks are skipped. When it becomes
    /// visible again and a full interval has passed since the last check,
    /// a check runs immediately.
    pub fn spawn(&self, visibility: watch::Receiver<Visibility>) -> JoinHandle<()> {
        tokio::spawn(poll_task(self.clone(), visibility))
    }

    fn set_state(&self, state: CheckerState) {
        let mut current = self.inner.state.write().expect("checker state lock poisoned");
        // Stopping wins over a check that was in flight.
        if *current != CheckerState::Stopped {
            *current = state;
        }
    }
}

async fn poll_task<S: UpdateSource>(
    checker: PollingUpdateChecker<S>,
    visibility: watch::Receiver<Visibility>,
) {
    let cancel = checker.inner.cancel.clone();
    let period = checker.inner.interval;
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut visible = *visibility.borrow();
    let mut visibility = Some(visibility);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if visible == Visibility::Visible {
                    checker.check_now().await;
                }
            }
            next = visibility_change(&mut visibility) => {
                visible = next;
                if visible == Visibility::Visible && checker.is_due() {
                    debug!("visible again after a full interval, checking now");
                    checker.check_now().await;
                    interval.reset();
                }
            }
        }

        if checker.state().is_terminal() {
            break;
        }
    }
    debug!(state = %checker.state(), "update polling stopped");
}

/// Wait for the next visibility value. Pends forever once the sender is
/// gone.
async fn visibility_change(rx: &mut Option<watch::Receiver<Visibility>>) -> Visibility {
    if let Some(receiver) = rx.as_mut() {
        if receiver.changed().await.is_ok() {
            return *receiver.borrow_and_update();
        }
    }
    *rx = None;
    std::future::pending().await
}
