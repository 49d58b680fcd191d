//! Centralized home-based storage paths.
//!
//! Everything lives under `~/.halo/` (or `$HALO_HOME` when set):
//! - `storage.json` - the key-value store document
//! - `config.yaml` - optional configuration
//! - `logs/` - rolling log files

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// The name of the halo directory under the user's home.
const HALO_DIR: &str = ".halo";

/// Environment variable overriding the home directory.
pub const HALO_HOME_ENV: &str = "HALO_HOME";

/// Returns the halo home directory, creating it if needed.
///
/// # Errors
///
/// Returns an error if:
/// - Home directory cannot be determined
/// - Directory creation fails
pub fn halo_home_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(HALO_HOME_ENV) {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => dirs::home_dir()
            .context("Could not determine home directory for halo storage")?
            .join(HALO_DIR),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create halo directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the store document path: `~/.halo/storage.json`
pub fn storage_path() -> Result<PathBuf> {
    Ok(halo_home_dir()?.join("storage.json"))
}

/// Returns the configuration path: `~/.halo/config.yaml`
pub fn config_path() -> Result<PathBuf> {
    Ok(halo_home_dir()?.join("config.yaml"))
}

/// Returns the logs directory: `~/.halo/logs/`
///
/// Creates the directory if it doesn't exist.
pub fn logs_dir() -> Result<PathBuf> {
    let dir = halo_home_dir()?.join("logs");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
