//! Configuration file resolution
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`FILMARC_CONFIG`)
//! 3. Platform config directory (`~/.config/filmarc/config.toml` on Linux)
//! 4. None: callers fall back to built-in defaults
//!
//! A missing config file is never an error; an explicitly named file that
//! does not exist is.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FILMARC_CONFIG";

/// Resolve which config file (if any) should be loaded
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<Option<PathBuf>> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return require_existing(path.to_path_buf(), "command-line argument");
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return require_existing(PathBuf::from(path), CONFIG_ENV_VAR);
        }
    }

    // Priority 3: Platform default location
    if let Some(path) = default_config_path() {
        if path.exists() {
            debug!(path = %path.display(), "Using platform config file");
            return Ok(Some(path));
        }
    }

    // Priority 4: Built-in defaults
    debug!("No config file found, using built-in defaults");
    Ok(None)
}

/// Platform-dependent default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("filmarc").join("config.toml"))
}

/// Read a TOML config file to a string
pub fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Failed to read config file");
        Error::Config(format!("Cannot read {}: {}", path.display(), e))
    })
}

fn require_existing(path: PathBuf, source: &str) -> Result<Option<PathBuf>> {
    if path.exists() {
        debug!(path = %path.display(), source, "Using config file");
        Ok(Some(path))
    } else {
        Err(Error::Config(format!(
            "Config file from {} not found: {}",
            source,
            path.display()
        )))
    }
}
