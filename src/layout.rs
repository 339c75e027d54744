//! Filesystem layout for an embedded broker
//!
//! Every embedded broker owns a base directory with three subdirectories:
//!
//! ```text
//! <base>/
//!   data/         broker storage
//!   conf/         broker configuration
//!   extensions/   broker extensions
//! ```

use crate::error::{EmbeddedError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base directory used when no configuration folder is supplied,
/// relative to the process working directory
pub const DEFAULT_BASE_DIR: &str = "mqtt-embedded";

/// Name of the broker data subdirectory
pub const DATA_DIR: &str = "data";

/// Name of the broker configuration subdirectory
pub const CONF_DIR: &str = "conf";

/// Name of the broker extensions subdirectory
pub const EXTENSIONS_DIR: &str = "extensions";

/// Resolved directory layout of an embedded broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerLayout {
    base: PathBuf,
    data: PathBuf,
    conf: PathBuf,
    extensions: PathBuf,
}

impl BrokerLayout {
    /// Resolves the layout under `config_folder`, or under [`DEFAULT_BASE_DIR`]
    /// when none is given. Nothing is created on disk.
    #[must_use]
    pub fn resolve(config_folder: Option<&Path>) -> Self {
        let base = config_folder.map_or_else(|| PathBuf::from(DEFAULT_BASE_DIR), Path::to_path_buf);
        Self::under(base)
    }

    fn under(base: PathBuf) -> Self {
        Self {
            data: base.join(DATA_DIR),
            conf: base.join(CONF_DIR),
            extensions: base.join(EXTENSIONS_DIR),
            base,
        }
    }

    /// Base directory
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Broker data directory
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data
    }

    /// Broker configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.conf
    }

    /// Broker extensions directory
    #[must_use]
    pub fn extensions_dir(&self) -> &Path {
        &self.extensions
    }

    /// The three broker directories in provisioning order
    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        [self.data.as_path(), self.conf.as_path(), self.extensions.as_path()].into_iter()
    }

    /// Creates the data, configuration and extensions directories,
    /// including any missing parents. Existing directories are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddedError::Provisioning`] naming the first directory
    /// that could not be created
    pub fn provision(&self) -> Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(dir).map_err(|e| EmbeddedError::Provisioning {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
            debug!("Provisioned broker directory: {}", dir.display());
        }
        Ok(())
    }

    /// Returns a copy of this layout with every path made absolute.
    /// An empty base resolves to the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined
    pub fn absolute(&self) -> Result<Self> {
        let base = if self.base.as_os_str().is_empty() {
            std::env::current_dir()?
        } else {
            std::path::absolute(&self.base)?
        };
        Ok(Self::under(base))
    }
}

impl Default for BrokerLayout {
    fn default() -> Self {
        Self::resolve(None)
    }
}
