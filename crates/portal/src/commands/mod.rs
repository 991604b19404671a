//! Command dispatch: bridges CLI args -> portal operations -> output formatting.

pub mod clock;
pub mod config_cmd;
pub mod content;
pub mod environment;
pub mod schedule;
pub mod session;
pub mod upload;
pub mod watch;

use portal_core::Portal;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a portal-bound command to the appropriate handler.
///
/// Every command except `logout` starts the portal first, the same way a
/// page load does.
pub async fn dispatch(cmd: Command, portal: &Portal, global: &GlobalOpts) -> Result<(), CliError> {
    if !matches!(cmd, Command::Logout) {
        portal.bootstrap().await?;
    }

    match cmd {
        Command::Environment => environment::handle(portal, global),
        Command::Content { slug } => content::handle(portal, slug.as_deref(), global).await,
        Command::Login(args) => session::login(portal, args, global).await,
        Command::Logout => session::logout(portal, global),
        Command::Whoami => session::whoami(portal, global),
        Command::Schedule => schedule::handle(portal, global),
        Command::Upload { file } => upload::handle(portal, &file, global).await,
        Command::Watch(args) => watch::handle(portal, args, global).await,
        // Handled before a portal is built
        Command::Clock(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
