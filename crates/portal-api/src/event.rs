// Event payload: program, venue layout and volunteer schedules.
//
// Scoped to the requesting volunteer by the `authToken` query parameter.
// `version` changes whenever the server-side schedule changes, which is
// what the update checker compares against.

use serde::{Deserialize, Serialize};

use crate::error::NotLoaded;
use crate::loader::{Payload, RemoteDataLoader, Versioned};
use crate::validate::{FieldKind, Shape};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub version: String,
    pub events: Vec<ProgramEvent>,
    pub locations: Vec<Location>,
    pub floors: Vec<Floor>,
    pub volunteers: Vec<Volunteer>,
}

/// An item in the public event program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sessions: Vec<ProgramSession>,
}

/// One scheduled occurrence of a [`ProgramEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSession {
    /// [`Location::id`] of the room.
    pub location: String,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
    /// [`Floor::id`] the location is on.
    pub floor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub user_token: String,
    pub first_name: String,
    pub last_name: String,
    pub shifts: Vec<Shift>,
}

impl Volunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftKind {
    Available,
    Unavailable,
    /// Working at a program event.
    Event,
    /// A general duty not tied to an event.
    Shift,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(rename = "type")]
    pub kind: ShiftKind,
    /// [`ProgramEvent::id`] for [`ShiftKind::Event`] shifts.
    #[serde(default)]
    pub event: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
}

// ── Shapes ──────────────────────────────────────────────────────────

impl ProgramEvent {
    fn shape() -> Shape {
        Shape::new("ProgramEvent")
            .field("id", FieldKind::String)
            .field("title", FieldKind::String)
            .optional("description", FieldKind::String)
            .array_of("sessions", ProgramSession::shape)
    }
}

impl ProgramSession {
    fn shape() -> Shape {
        Shape::new("ProgramSession")
            .field("location", FieldKind::String)
            .field("startTime", FieldKind::Number)
            .field("endTime", FieldKind::Number)
    }
}

impl Location {
    fn shape() -> Shape {
        Shape::new("Location")
            .field("id", FieldKind::String)
            .field("name", FieldKind::String)
            .optional("area", FieldKind::String)
            .field("floor", FieldKind::Number)
    }
}

impl Floor {
    fn shape() -> Shape {
        Shape::new("Floor")
            .field("id", FieldKind::Number)
            .field("name", FieldKind::String)
    }
}

impl Volunteer {
    fn shape() -> Shape {
        Shape::new("Volunteer")
            .field("userToken", FieldKind::String)
            .field("firstName", FieldKind::String)
            .field("lastName", FieldKind::String)
            .array_of("shifts", Shift::shape)
    }
}

impl Shift {
    fn shape() -> Shape {
        Shape::new("Shift")
            .field("type", FieldKind::String)
            .optional("event", FieldKind::String)
            .field("startTime", FieldKind::Number)
            .field("endTime", FieldKind::Number)
    }
}

impl Payload for EventData {
    const TYPE_NAME: &'static str = "EventData";

    fn shape() -> Shape {
        Shape::new(Self::TYPE_NAME)
            .field("version", FieldKind::String)
            .array_of("events", ProgramEvent::shape)
            .array_of("locations", Location::shape)
            .array_of("floors", Floor::shape)
            .array_of("volunteers", Volunteer::shape)
    }
}

impl Versioned for EventData {
    fn version(&self) -> &str {
        &self.version
    }
}

// ── Loader accessors ────────────────────────────────────────────────

pub type EventLoader = RemoteDataLoader<EventData>;

impl RemoteDataLoader<EventData> {
    pub fn version(&self) -> Result<String, NotLoaded> {
        self.read(|d| d.version.clone())
    }

    pub fn events(&self) -> Result<Vec<ProgramEvent>, NotLoaded> {
        self.read(|d| d.events.clone())
    }

    pub fn event(&self, id: &str) -> Result<Option<ProgramEvent>, NotLoaded> {
        self.read(|d| d.events.iter().find(|e| e.id == id).cloned())
    }

    pub fn locations(&self) -> Result<Vec<Location>, NotLoaded> {
        self.read(|d| d.locations.clone())
    }

    pub fn location(&self, id: &str) -> Result<Option<Location>, NotLoaded> {
        self.read(|d| d.locations.iter().find(|l| l.id == id).cloned())
    }

    pub fn floors(&self) -> Result<Vec<Floor>, NotLoaded> {
        self.read(|d| d.floors.clone())
    }

    pub fn volunteer(&self, user_token: &str) -> Result<Option<Volunteer>, NotLoaded> {
        self.read(|d| {
            d.volunteers
                .iter()
                .find(|v| v.user_token == user_token)
                .cloned()
        })
    }

    /// Shifts of one volunteer, ordered by start time.
    pub fn shifts_for(&self, user_token: &str) -> Result<Vec<Shift>, NotLoaded> {
        let mut shifts = self
            .volunteer(user_token)?
            .map(|v| v.shifts)
            .unwrap_or_default();
        shifts.sort_by_key(|s| s.start_time);
        Ok(shifts)
    }
}
