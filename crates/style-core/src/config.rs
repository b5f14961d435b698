//! Updater configuration
//!
//! Loaded from `stylecheck.toml`, `stylecheck.json` or `stylecheck.yaml`
//! through [`style_fs::ConfigStore`]. Every key has a default, so a missing
//! file or a partial file are both valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use style_fs::ConfigStore;

use crate::Result;

/// Config file names probed by [`UpdaterConfig::discover`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &["stylecheck.toml", "stylecheck.json", "stylecheck.yaml"];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Hours between scheduled checks; `0` disables scheduling.
    pub interval_hours: f64,
    /// Lower bound on any scheduled delay.
    pub min_delay_secs: u64,
    /// Delay before the single retry of a "service unavailable" failure.
    pub retry_delay_ms: u64,
    pub log: LogSettings,
    pub http: HttpSettings,
    /// Root directory of the file-backed stores.
    pub data_dir: PathBuf,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24.0,
            min_delay_secs: 10,
            retry_delay_ms: 1000,
            log: LogSettings::default(),
            http: HttpSettings::default(),
            data_dir: PathBuf::from(".stylecheck"),
        }
    }
}

impl UpdaterConfig {
    /// Load from an explicit path; the file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    /// Load the first config file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let store = ConfigStore::new();
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Ok(store.load(&path)?);
            }
        }
        Ok(Self::default())
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Activity log settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub max_lines: usize,
    pub timestamp_gap_secs: u64,
    pub debounce_ms: u64,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            timestamp_gap_secs: 11,
            debounce_ms: 1000,
        }
    }
}

impl LogSettings {
    pub fn timestamp_gap(&self) -> Duration {
        Duration::from_secs(self.timestamp_gap_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Maximum accepted response body (bytes)
    pub max_content_size: u64,
    pub proxy_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_content_size: 5 * 1024 * 1024,
            proxy_url: None,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
