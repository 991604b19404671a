// portal-api: Async client for the volunteer portal JSON API
//
// Every response flows through the same pipeline: HTTP → JSON → `success`
// sentinel → declarative shape → typed struct. Loaders keep the last valid
// snapshot and refuse access until one exists.

pub mod content;
pub mod environment;
pub mod error;
pub mod event;
pub mod loader;
pub mod login;
pub mod transport;
pub mod upload;
pub mod validate;

pub use content::{ContentData, ContentLoader, ContentPage};
pub use environment::{EnvironmentData, EnvironmentLoader};
pub use error::{Error, FailureKind, NotLoaded};
pub use event::{
    EventData, EventLoader, Floor, Location, ProgramEvent, ProgramSession, Shift, ShiftKind,
    Volunteer,
};
pub use loader::{LoadState, Payload, RemoteDataLoader, Versioned};
pub use login::{LoginClient, LoginData, UserLoader};
pub use transport::TransportConfig;
pub use upload::{UploadClient, UploadResult};
pub use validate::{FieldKind, Shape, ValidationError, ValidationReason, validate_field};
