//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default quiet period before a burst of file changes triggers a sync.
pub const DEFAULT_DEBOUNCE_SECS: u64 = 2;

/// Default interval between periodic remote pulls.
pub const DEFAULT_PULL_INTERVAL_SECS: u64 = 300;

/// Main configuration for Satchel.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory holding the `SQLite` database, the document store,
    /// and the daemon status file. Doubles as the git repository root.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Quiet period in seconds before a change burst triggers a sync.
    pub debounce_secs: u64,

    /// Interval in seconds between periodic remote pulls in watch mode.
    pub pull_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./satchel-data"),
            log_level: "info".to_string(),
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            pull_interval_secs: DEFAULT_PULL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::config("data_dir cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.debounce_secs == 0 {
            return Err(Error::config("debounce_secs cannot be 0"));
        }

        if self.debounce_secs > 3600 {
            return Err(Error::config("debounce_secs cannot exceed 3600"));
        }

        if self.pull_interval_secs == 0 {
            return Err(Error::config("pull_interval_secs cannot be 0"));
        }

        Ok(())
    }

    /// Get the path to the `SQLite` database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("satchel.db")
    }

    /// Get the path to the daemon status file.
    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join("daemon-status.json")
    }

    /// Get the directory where ingested documents are stored.
    #[must_use]
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Debounce quiet period as a `Duration`.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    /// Periodic pull interval as a `Duration`.
    #[must_use]
    pub const fn pull_interval(&self) -> Duration {
        Duration::from_secs(self.pull_interval_secs)
    }
}
