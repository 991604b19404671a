// ── Portal facade ──
//
// Owns everything a page needs: the shared HTTP client, the loaders, the
// notifiers, the clock, the title and the user. Cloning is cheap.

use std::sync::{Arc, Mutex};

use portal_api::{
    ContentLoader, EnvironmentLoader, EventLoader, LoginClient, UploadClient, UserLoader,
};
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{Configuration, Endpoint};
use crate::error::CoreError;
use crate::notifier::Notifiers;
use crate::poller::{EventUpdateSource, PollingUpdateChecker, Visibility};
use crate::session::User;
use crate::storage::Storage;
use crate::title::TitleManager;

#[derive(Clone)]
pub struct Portal {
    inner: Arc<PortalInner>,
}

struct PortalInner {
    configuration: Configuration,
    notifiers: Notifiers,
    environment: EnvironmentLoader,
    content: ContentLoader,
    event: Arc<EventLoader>,
    upload: UploadClient,
    user: User,
    clock: Arc<Clock>,
    title: TitleManager,
    checker: Mutex<Option<PollingUpdateChecker<EventUpdateSource>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Portal {
    /// Wire up all components. Nothing is fetched until
    /// [`bootstrap`](Self::bootstrap).
    pub fn new(configuration: Configuration, storage: Arc<dyn Storage>) -> Result<Self, CoreError> {
        let http = configuration.transport().build_client()?;
        let endpoint = |e: Endpoint| configuration.endpoint(e).clone();

        let notifiers = Notifiers::default();
        let clock = Arc::new(Clock::new(Arc::clone(&storage), Arc::clone(&notifiers.time)));
        let user = User::new(
            storage,
            Arc::clone(&clock),
            LoginClient::new(http.clone(), endpoint(Endpoint::Login)),
            UserLoader::new(http.clone(), endpoint(Endpoint::Login)),
        );
        let title = TitleManager::new(Arc::clone(&notifiers.title));

        Ok(Self {
            inner: Arc::new(PortalInner {
                environment: EnvironmentLoader::new(http.clone(), endpoint(Endpoint::Environment)),
                content: ContentLoader::new(http.clone(), endpoint(Endpoint::Content)),
                event: Arc::new(EventLoader::new(http.clone(), endpoint(Endpoint::Event))),
                upload: UploadClient::new(http, endpoint(Endpoint::Upload)),
                configuration,
                notifiers,
                user,
                clock,
                title,
                checker: Mutex::new(None),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Environment → title → session → schedule.
    ///
    /// Only the environment is required; a failed session check or schedule
    /// load leaves the portal usable in a reduced mode.
    pub async fn bootstrap(&self) -> Result<(), CoreError> {
        let environment = self
            .inner
            .environment
            .fetch(&[])
            .await
            .map_err(CoreError::Bootstrap)?;
        self.inner.title.set_suffix(environment.portal_title.clone());
        info!(event = %environment.event_name, year = environment.year, "portal environment loaded");

        if self.inner.user.initialize().await {
            match self.load_schedule().await {
                Ok(true) => debug!("schedule loaded"),
                Ok(false) => debug!("schedule unavailable"),
                Err(e) => warn!(error = %e, "cannot load schedule"),
            }
        }
        Ok(())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.inner.configuration
    }

    pub fn notifiers(&self) -> &Notifiers {
        &self.inner.notifiers
    }

    pub fn environment(&self) -> &EnvironmentLoader {
        &self.inner.environment
    }

    pub fn content(&self) -> &ContentLoader {
        &self.inner.content
    }

    pub fn event(&self) -> &EventLoader {
        &self.inner.event
    }

    pub fn user(&self) -> &User {
        &self.inner.user
    }

    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    pub fn title(&self) -> &TitleManager {
        &self.inner.title
    }

    pub async fn load_content(&self) -> bool {
        self.inner.content.initialize().await
    }

    /// Load the event payload for the signed-in volunteer.
    pub async fn load_schedule(&self) -> Result<bool, CoreError> {
        let auth_token = self.inner.user.auth_token()?;
        Ok(self
            .inner
            .event
            .load(&[("authToken", auth_token.expose_secret())])
            .await)
    }

    /// Start polling for schedule changes against the loaded version.
    ///
    /// Replaces (and stops) any checker started earlier.
    pub fn start_update_checker(
        &self,
        visibility: watch::Receiver<Visibility>,
    ) -> Result<PollingUpdateChecker<EventUpdateSource>, CoreError> {
        let version = self.inner.event.version()?;
        let source = EventUpdateSource::new(
            Arc::clone(&self.inner.event),
            Some(self.inner.user.auth_token()?),
        );
        let checker = PollingUpdateChecker::new(
            source,
            version,
            self.inner.configuration.poll_interval,
            &self.inner.notifiers,
        );

        let previous = self
            .inner
            .checker
            .lock()
            .expect("checker lock poisoned")
            .replace(checker.clone());
        if let Some(previous) = previous {
            previous.stop();
        }

        let handle = checker.spawn(visibility);
        let mut tasks = self.inner.tasks.lock().expect("task lock poisoned");
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
        drop(tasks);
        debug!(interval = ?checker.interval(), version = checker.version(), "update checker started");
        Ok(checker)
    }

    /// Upload a new avatar for the signed-in volunteer.
    pub async fn upload_avatar(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), CoreError> {
        let auth_token = self.inner.user.auth_token()?;
        self.inner
            .upload
            .upload_avatar(&auth_token, file_name, bytes)
            .await?;
        Ok(())
    }

    /// Background tasks that have not finished yet.
    pub fn running_tasks(&self) -> usize {
        let mut tasks = self.inner.tasks.lock().expect("task lock poisoned");
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }

    /// Stop background work and wait for it to finish.
    pub async fn shutdown(&self) {
        let checker = self.inner.checker.lock().expect("checker lock poisoned").take();
        if let Some(checker) = checker {
            checker.stop();
        }

        let handles: Vec<_> = self
            .inner
            .tasks
            .lock()
            .expect("task lock poisoned")
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        debug!("portal shut down");
    }
}
