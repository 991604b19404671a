// portal-core: Session, clock, notifiers and update polling on top of portal-api.

pub mod clock;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod portal;
pub mod session;
pub mod storage;
pub mod title;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, TIME_OFFSET_KEY};
pub use config::{Configuration, Endpoint};
pub use error::CoreError;
pub use notifier::{
    MenuEvent, Notifier, Notifiers, Observer, ReloadRequest, ScheduleUpdate, Subscription,
};
pub use poller::{
    CheckOutcome, CheckerState, EventUpdateSource, LoaderUpdateSource, PollingUpdateChecker,
    UpdateSource, Visibility,
};
pub use portal::Portal;
pub use session::{AccessTokens, LOGIN_KEY, User};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use title::TitleManager;
