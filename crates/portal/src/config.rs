//! CLI configuration: a thin layer over `portal_config`.
//!
//! Flag overrides (`--url`, `--timeout`, `--data-dir`, `--config`) are
//! applied on top of the file and environment values.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use portal_core::Configuration;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use portal_config::{Config, ConfigError, load_config_from, save_config_to};

/// The config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(portal_config::config_path)
}

/// Load the config and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&config_file(global))?;
    if let Some(ref url) = global.url {
        cfg.base_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }
    if let Some(ref dir) = global.data_dir {
        cfg.data_dir = Some(dir.clone());
    }
    Ok(cfg)
}

/// Translate the config into a runtime `Configuration`.
///
/// `interval` overrides the configured poll interval.
pub fn resolve(
    global: &GlobalOpts,
    cfg: &Config,
    interval: Option<&str>,
) -> Result<Configuration, CliError> {
    let configuration = cfg.to_configuration().map_err(|e| match e {
        ConfigError::MissingBaseUrl => CliError::NoConfig {
            path: config_file(global).display().to_string(),
        },
        other => other.into(),
    })?;

    match interval {
        Some(raw) => {
            let interval = parse_duration("--interval", raw)?;
            Ok(configuration.with_poll_interval(interval))
        }
        None => Ok(configuration),
    }
}

/// Output format: flag, then config default, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .clone()
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Color mode: flag, then config default, then auto.
pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global
        .color
        .clone()
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}

/// Color for the error banner in `main`, resolved before the command runs.
///
/// An unreadable config falls back to the flag alone; the command itself
/// reports that failure.
pub fn banner_color_mode(global: &GlobalOpts) -> ColorMode {
    load(global).map_or_else(|_| global.color(), |cfg| color_mode(global, &cfg))
}

pub fn parse_duration(field: &str, raw: &str) -> Result<Duration, CliError> {
    let duration = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })?;
    if duration.is_zero() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(duration)
}
