//! Schedule command handler: the signed-in volunteer's shifts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use portal_api::{EventLoader, Shift, ShiftKind};
use portal_core::Portal;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// A shift resolved against the program and venue.
#[derive(Debug, Serialize)]
struct ShiftView {
    kind: String,
    event: Option<String>,
    location: Option<String>,
    start: String,
    end: String,
    status: &'static str,
}

impl ShiftView {
    fn resolve(shift: &Shift, event: &EventLoader, now: DateTime<Utc>) -> Self {
        let program = shift
            .event
            .as_deref()
            .and_then(|id| event.event(id).ok().flatten());

        // The session overlapping the shift, else the first one.
        let location = program.as_ref().and_then(|p| {
            p.sessions
                .iter()
                .find(|s| s.start_time < shift.end_time && s.end_time > shift.start_time)
                .or_else(|| p.sessions.first())
                .and_then(|s| event.location(&s.location).ok().flatten())
                .map(|l| l.name)
        });

        let status = if now.timestamp() >= shift.end_time {
            "done"
        } else if now.timestamp() >= shift.start_time {
            "now"
        } else {
            "upcoming"
        };

        Self {
            kind: kind_label(shift.kind).into(),
            event: program.map(|p| p.title),
            location,
            start: format_time(shift.start_time),
            end: format_time(shift.end_time),
            status,
        }
    }
}

fn kind_label(kind: ShiftKind) -> &'static str {
    match kind {
        ShiftKind::Available => "available",
        ShiftKind::Unavailable => "unavailable",
        ShiftKind::Event => "event",
        ShiftKind::Shift => "shift",
        ShiftKind::Unknown => "other",
    }
}

fn format_time(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%a %Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ShiftRow {
    #[tabled(rename = "Start (UTC)")]
    start: String,
    #[tabled(rename = "End (UTC)")]
    end: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&ShiftView> for ShiftRow {
    fn from(s: &ShiftView) -> Self {
        Self {
            start: s.start.clone(),
            end: s.end.clone(),
            kind: s.kind.clone(),
            event: s.event.clone().unwrap_or_default(),
            location: s.location.clone().unwrap_or_default(),
            status: s.status.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    let user_token = portal.user().user_token()?;
    let event = portal.event();
    let now = portal.clock().now();

    let shifts: Vec<ShiftView> = event
        .shifts_for(&user_token)?
        .iter()
        .map(|s| ShiftView::resolve(s, event, now))
        .collect();

    if shifts.is_empty() && !global.quiet {
        eprintln!("No shifts scheduled");
    }
    let out = output::render_list(
        &global.output(),
        &shifts,
        |s| ShiftRow::from(s),
        |s| format!("{}\t{}", s.start, s.event.as_deref().unwrap_or(&s.kind)),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
