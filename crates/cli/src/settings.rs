// Config file discovery
// Explicit --config / $PARFOLIO_CONFIG first, then ~/.config/parfolio/parfolio.toml

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use parfolio_engine::PortfolioConfig;

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO};
use crate::CliError;

/// Per-user config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parfolio")
        .join("parfolio.toml")
}

/// Resolve and load the config.
///
/// An explicit path must exist. The per-user file is optional; without it
/// the built-in column names and policies apply.
pub fn load_config(explicit: Option<&Path>) -> Result<PortfolioConfig, CliError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let path = default_config_path();
    if path.is_file() {
        return read_config(&path);
    }

    debug!("no config file at {}, using defaults", path.display());
    Ok(PortfolioConfig::default())
}

fn read_config(path: &Path) -> Result<PortfolioConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;

    let config = PortfolioConfig::from_toml(&text).map_err(|e| {
        CliError {
            code: EXIT_INVALID_CONFIG,
            message: format!("{}: {e}", path.display()),
            hint: None,
        }
        .with_hint("see `[roster.columns]`, `[payments.columns]`, `duplicate_keys`, `[report]`")
    })?;

    info!("loaded config from {}", path.display());
    Ok(config)
}
