//! Config subcommand handlers.

use std::path::Path;

use url::Url;

use portal_core::Endpoint;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, CliError> {
    Url::parse(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// The file as written, without environment overrides.
fn read_file(path: &Path) -> Result<Config, CliError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| CliError::Validation {
        field: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn to_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# cannot render config: {e}"))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);

    match args.command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = output::render_single(
                &config::output_format(global, &cfg),
                &cfg,
                to_toml,
                |c| c.base_url.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { base_url, force } => {
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }
            let base = parse_url("base_url", &base_url)?;
            let cfg = Config {
                base_url: Some(base.to_string()),
                ..Config::default()
            };
            // Fail now rather than on first use.
            cfg.to_configuration()?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::SetEndpoint { name, url } => {
            let endpoint: Endpoint = name.parse().map_err(|_| CliError::Validation {
                field: "endpoint".into(),
                reason: format!(
                    "unknown endpoint '{name}' (expected environment, content, event, login or upload)"
                ),
            })?;
            let url = parse_url(&format!("endpoints.{endpoint}"), &url)?;

            let mut cfg = read_file(&path)?;
            cfg.set_endpoint(endpoint, &url);
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("{endpoint} -> {url}");
            }
            Ok(())
        }
    }
}
