//! Clock command handlers.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use portal_core::Clock;

use crate::cli::{ClockArgs, ClockCommand, GlobalOpts};
use crate::config::parse_duration;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ClockView {
    now: String,
    offset_seconds: i64,
    overridden: bool,
}

fn detail(view: &ClockView, color: bool) -> String {
    let offset = if view.overridden {
        format_offset(view.offset_seconds)
    } else {
        output::muted("none (system time)", color)
    };
    output::detail_lines(&[("Now", view.now.clone()), ("Offset", offset)])
}

fn format_offset(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "+" };
    let duration = std::time::Duration::from_secs(seconds.unsigned_abs());
    format!("{sign}{}", humantime::format_duration(duration))
}

/// Parse "2h", "-30m", "+1d 2h".
fn parse_offset(raw: &str) -> Result<TimeDelta, CliError> {
    let (negative, magnitude) = match raw.trim().strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.trim().trim_start_matches('+')),
    };
    let duration = parse_duration("offset", magnitude)?;
    let delta = TimeDelta::from_std(duration).map_err(|e| CliError::Validation {
        field: "offset".into(),
        reason: e.to_string(),
    })?;
    Ok(if negative { -delta } else { delta })
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CliError::Validation {
            field: "time".into(),
            reason: format!("expected RFC 3339, e.g. 2019-06-08T10:00:00+01:00 ({e})"),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(clock: &Clock, args: ClockArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ClockCommand::Show => {}
        ClockCommand::Set { time } => clock.set_time(parse_time(&time)?)?,
        ClockCommand::Offset { offset } => clock.set_offset(parse_offset(&offset)?)?,
        ClockCommand::Reset => clock.reset()?,
    }

    let view = ClockView {
        now: clock.now().to_rfc3339(),
        offset_seconds: clock.offset().num_seconds(),
        overridden: clock.is_overridden(),
    };
    let color = output::should_color(&global.color());
    let out = output::render_single(
        &global.output(),
        &view,
        |v| detail(v, color),
        |v| v.now.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
