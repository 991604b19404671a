mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use portal_core::{Clock, FileStorage, Notifier, Portal, Storage};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let color = output::should_color(&config::banner_color_mode(&cli.global));
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        if color {
            eprintln!("{}", "error".red().bold());
        }
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        mut global,
        command,
    } = cli;

    match command {
        // Config commands work without a portal
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "portal", &mut std::io::stdout());
            Ok(())
        }

        // The clock only touches local state
        Command::Clock(args) => {
            let cfg = config::load(&global)?;
            global.output = Some(config::output_format(&global, &cfg));
            global.color = Some(config::color_mode(&global, &cfg));
            let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(cfg.storage_path()));
            let clock = Clock::new(storage, Arc::new(Notifier::new("time")));
            commands::clock::handle(&clock, args, &global)
        }

        cmd => {
            let cfg = config::load(&global)?;
            global.output = Some(config::output_format(&global, &cfg));
            global.color = Some(config::color_mode(&global, &cfg));

            let interval = match &cmd {
                Command::Watch(args) => args.interval.as_deref(),
                _ => None,
            };
            let configuration = config::resolve(&global, &cfg, interval)?;
            let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(cfg.storage_path()));
            let portal = Portal::new(configuration, storage)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &portal, &global).await
        }
    }
}
