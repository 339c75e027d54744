//! Supervisor configuration
//!
//! Options for the embedded broker supervisor. The broker's own settings
//! live in the provisioned `conf` directory and are read by the engine.

use crate::error::{EmbeddedError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Supervisor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Base directory for the broker layout; `mqtt-embedded` when unset
    pub config_folder: Option<PathBuf>,

    /// Upper bound on a single broker start; unbounded when unset
    pub start_timeout: Option<Duration>,

    /// Upper bound on a single broker stop; unbounded when unset
    pub stop_timeout: Option<Duration>,
}

impl SupervisorConfig {
    /// Creates a new supervisor configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base directory of the broker layout
    #[must_use]
    pub fn with_config_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config_folder = Some(folder.into());
        self
    }

    /// Bounds how long a start may take
    #[must_use]
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    /// Bounds how long a stop may take
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    /// Loads a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero
    pub fn validate(&self) -> Result<&Self> {
        if self.start_timeout == Some(Duration::ZERO) {
            return Err(EmbeddedError::Configuration(
                "start_timeout must be greater than 0".to_string(),
            ));
        }

        if self.stop_timeout == Some(Duration::ZERO) {
            return Err(EmbeddedError::Configuration(
                "stop_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(self)
    }
}
