//! Watch handler: poll for schedule changes until one arrives.

use tokio::sync::{mpsc, watch};

use portal_core::{CheckOutcome, Portal, Visibility};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

enum Signal {
    Updated { previous: String, current: String },
    Reload(String),
}

pub async fn handle(portal: &Portal, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !portal.user().is_identified() {
        return Err(CliError::NotSignedIn);
    }

    // A terminal is always visible.
    let (_visibility, rx) = watch::channel(Visibility::Visible);
    let checker = portal.start_update_checker(rx)?;
    let color = output::should_color(&global.color());

    if args.once {
        let outcome = checker.check_now().await;
        portal.shutdown().await;
        return report_once(outcome, checker.version(), global);
    }

    let (tx, mut signals) = mpsc::unbounded_channel();
    let updates = tx.clone();
    let _schedule = portal.notifiers().schedule.subscribe(move |update| {
        let _ = updates.send(Signal::Updated {
            previous: update.previous.clone(),
            current: update.current.clone(),
        });
    });
    let _reload = portal.notifiers().reload.subscribe(move |request| {
        let _ = tx.send(Signal::Reload(request.reason.clone()));
    });

    if !global.quiet {
        eprintln!(
            "{}",
            output::muted(
                &format!(
                    "Watching schedule {} every {}",
                    checker.version(),
                    humantime::format_duration(checker.interval())
                ),
                color
            )
        );
    }

    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(()),
        signal = signals.recv() => match signal {
            Some(Signal::Updated { previous, current }) => {
                let line = format!("Schedule updated: {previous} -> {current}");
                output::print_output(&output::heading(&line, color), global.quiet);
                Ok(())
            }
            Some(Signal::Reload(message)) => Err(CliError::Rejected { message }),
            None => Ok(()),
        },
    };

    portal.shutdown().await;
    result
}

fn report_once(outcome: CheckOutcome, version: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let line = match outcome {
        CheckOutcome::NoChange => format!("Schedule {version} is current"),
        CheckOutcome::Changed(update) => {
            format!("Schedule updated: {} -> {}", update.previous, update.current)
        }
        CheckOutcome::ReloadRequested => {
            return Err(CliError::Rejected {
                message: "the stored session is no longer accepted".into(),
            });
        }
        CheckOutcome::Failed => {
            return Err(CliError::NotLoaded {
                what: "Schedule version".into(),
            });
        }
        CheckOutcome::Skipped => format!("Schedule {version} was not checked"),
    };
    output::print_output(&line, global.quiet);
    Ok(())
}
