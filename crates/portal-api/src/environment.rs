// Environment payload: event-wide settings every page needs at startup.

use serde::{Deserialize, Serialize};

use crate::error::NotLoaded;
use crate::loader::{Payload, RemoteDataLoader};
use crate::validate::{FieldKind, Shape};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    pub event_name: String,
    pub portal_title: String,
    /// Title given to senior volunteers at this event.
    pub senior_title: String,
    /// IANA time zone of the event venue.
    pub timezone: String,
    pub year: u32,
}

impl Payload for EnvironmentData {
    const TYPE_NAME: &'static str = "EnvironmentData";

    fn shape() -> Shape {
        Shape::new(Self::TYPE_NAME)
            .field("eventName", FieldKind::String)
            .field("portalTitle", FieldKind::String)
            .field("seniorTitle", FieldKind::String)
            .field("timezone", FieldKind::String)
            .field("year", FieldKind::Number)
    }
}

pub type EnvironmentLoader = RemoteDataLoader<EnvironmentData>;

impl RemoteDataLoader<EnvironmentData> {
    pub fn event_name(&self) -> Result<String, NotLoaded> {
        self.read(|d| d.event_name.clone())
    }

    pub fn portal_title(&self) -> Result<String, NotLoaded> {
        self.read(|d| d.portal_title.clone())
    }

    pub fn senior_title(&self) -> Result<String, NotLoaded> {
        self.read(|d| d.senior_title.clone())
    }

    pub fn timezone(&self) -> Result<String, NotLoaded> {
        self.read(|d| d.timezone.clone())
    }

    pub fn year(&self) -> Result<u32, NotLoaded> {
        self.read(|d| d.year)
    }
}
