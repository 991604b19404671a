// ── Observer registries ──
//
// One `Notifier` per event stream, constructed explicitly and shared by
// `Arc`. Observers are identified by the pointer of their `Arc`, so the
// same handle can be added any number of times and is delivered once.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use chrono::{DateTime, Utc};
use tracing::trace;

/// A registered callback.
pub type Observer<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Synchronous fan-out to a set of observers.
///
/// Delivery order between observers is unspecified. Observers may add or
/// remove observers (including themselves) from inside a callback; an
/// observer removed mid-delivery is skipped if it has not been called yet.
pub struct Notifier<A> {
    name: &'static str,
    observers: RwLock<Vec<Observer<A>>>,
}

impl<A> Notifier<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrap a closure into an observer handle.
    pub fn observer(f: impl Fn(&A) + Send + Sync + 'static) -> Observer<A> {
        Arc::new(f)
    }

    /// Register `observer`. Returns `false` if it was already registered.
    pub fn add_observer(&self, observer: &Observer<A>) -> bool {
        let mut observers = self.observers.write().expect("notifier lock poisoned");
        if observers.iter().any(|o| Arc::ptr_eq(o, observer)) {
            return false;
        }
        observers.push(Arc::clone(observer));
        true
    }

    /// Unregister `observer`. Returns `false` if it was not registered.
    pub fn remove_observer(&self, observer: &Observer<A>) -> bool {
        let mut observers = self.observers.write().expect("notifier lock poisoned");
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn contains(&self, observer: &Observer<A>) -> bool {
        self.observers
            .read()
            .expect("notifier lock poisoned")
            .iter()
            .any(|o| Arc::ptr_eq(o, observer))
    }

    pub fn len(&self) -> usize {
        self.observers.read().expect("notifier lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every registered observer with `args` and return how many were
    /// called. Nothing is buffered for observers registered later.
    pub fn notify(&self, args: &A) -> usize {
        // No lock is held while observers run.
        let snapshot = self.observers.read().expect("notifier lock poisoned").clone();

        let mut delivered = 0;
        for observer in &snapshot {
            if !self.contains(observer) {
                continue;
            }
            observer(args);
            delivered += 1;
        }
        trace!(notifier = self.name, delivered, "notified");
        delivered
    }

    /// Register `f` for as long as the returned guard lives.
    pub fn subscribe(self: &Arc<Self>, f: impl Fn(&A) + Send + Sync + 'static) -> Subscription<A> {
        let observer = Self::observer(f);
        self.add_observer(&observer);
        Subscription {
            notifier: Arc::downgrade(self),
            observer,
        }
    }
}

impl<A> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("name", &self.name)
            .field("observers", &self.len())
            .finish()
    }
}

/// Removes its observer when dropped.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription<A> {
    notifier: Weak<Notifier<A>>,
    observer: Observer<A>,
}

impl<A> Subscription<A> {
    pub fn observer(&self) -> &Observer<A> {
        &self.observer
    }
}

impl<A> Drop for Subscription<A> {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.remove_observer(&self.observer);
        }
    }
}

// ── Event streams ────────────────────────────────────────────────────

/// The event schedule changed on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleUpdate {
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MenuEvent {
    Open,
    Close,
}

/// The application should reload from scratch, e.g. because the server
/// no longer accepts the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub reason: String,
}

/// One notifier per stream.
#[derive(Debug, Clone)]
pub struct Notifiers {
    /// Full document title.
    pub title: Arc<Notifier<String>>,
    pub schedule: Arc<Notifier<ScheduleUpdate>>,
    pub menu: Arc<Notifier<MenuEvent>>,
    /// Current (possibly overridden) time.
    pub time: Arc<Notifier<DateTime<Utc>>>,
    pub reload: Arc<Notifier<ReloadRequest>>,
}

impl Default for Notifiers {
    fn default() -> Self {
        Self {
            title: Arc::new(Notifier::new("title")),
            schedule: Arc::new(Notifier::new("schedule")),
            menu: Arc::new(Notifier::new("menu")),
            time: Arc::new(Notifier::new("time")),
            reload: Arc::new(Notifier::new("reload")),
        }
    }
}
