use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, read from `~/.halo/config.yaml`.
///
/// Every section is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Override for the store document path. Defaults to `~/.halo/storage.json`.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
    #[serde(default)]
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

/// Knobs of the usage accounting service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccountingConfig {
    /// Usage counted per accepted heartbeat, seconds. Default: 5
    #[serde(default = "default_heartbeat_slice_secs")]
    pub heartbeat_slice_secs: u64,
    /// Heartbeats closer than this to the last accepted one are dropped. Default: 4000
    #[serde(default = "default_min_heartbeat_gap_ms")]
    pub min_heartbeat_gap_ms: u64,
    /// Minutes added to a limit by one extension. Default: 5
    #[serde(default = "default_extension_minutes")]
    pub extension_minutes: u64,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            heartbeat_slice_secs: default_heartbeat_slice_secs(),
            min_heartbeat_gap_ms: default_min_heartbeat_gap_ms(),
            extension_minutes: default_extension_minutes(),
        }
    }
}

impl AccountingConfig {
    pub fn min_heartbeat_gap(&self) -> Duration {
        Duration::from_millis(self.min_heartbeat_gap_ms)
    }
}

fn default_heartbeat_slice_secs() -> u64 {
    5
}

fn default_min_heartbeat_gap_ms() -> u64 {
    4000
}

fn default_extension_minutes() -> u64 {
    5
}

/// Heartbeat source settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrackerConfig {
    /// Heartbeat cadence, seconds. Default: 5
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Hosts whose pages are tracked (subdomains included).
    #[serde(default = "default_tracked_hosts")]
    pub tracked_hosts: Vec<String>,
    /// Path prefix identifying short-form video pages. Default: "/shorts/"
    #[serde(default = "default_short_form_prefix")]
    pub short_form_prefix: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            tracked_hosts: default_tracked_hosts(),
            short_form_prefix: default_short_form_prefix(),
        }
    }
}

impl TrackerConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    5
}

fn default_tracked_hosts() -> Vec<String> {
    vec!["youtube.com".to_string(), "youtu.be".to_string()]
}

fn default_short_form_prefix() -> String {
    "/shorts/".to_string()
}

/// Presentation monitor settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PresentationConfig {
    /// Fixed re-evaluation interval of the block state, milliseconds. Default: 1000
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl PresentationConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.accounting.heartbeat_slice_secs == 0 {
            anyhow::bail!("accounting.heartbeat_slice_secs must be greater than zero");
        }

        if self.accounting.extension_minutes == 0 {
            anyhow::bail!("accounting.extension_minutes must be greater than zero");
        }

        if self.tracker.heartbeat_interval_secs == 0 {
            anyhow::bail!("tracker.heartbeat_interval_secs must be greater than zero");
        }

        if self.tracker.tracked_hosts.is_empty() {
            anyhow::bail!("At least one tracked host must be configured");
        }

        if !self.tracker.short_form_prefix.starts_with('/') {
            anyhow::bail!(
                "tracker.short_form_prefix must start with '/': {}",
                self.tracker.short_form_prefix
            );
        }

        if self.presentation.refresh_interval_ms == 0 {
            anyhow::bail!("presentation.refresh_interval_ms must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
