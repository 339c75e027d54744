//! Broker descriptor
//!
//! The descriptor binds the three broker directories and is handed to an
//! [`EngineFactory`](crate::engine::EngineFactory) once per start cycle.

use crate::error::{EmbeddedError, Result};
use crate::layout::BrokerLayout;
use std::path::{Path, PathBuf};

/// Immutable set of absolute directories an embedded broker is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerDescriptor {
    data_folder: PathBuf,
    configuration_folder: PathBuf,
    extensions_folder: PathBuf,
}

impl BrokerDescriptor {
    /// Creates an empty descriptor builder
    #[must_use]
    pub fn builder() -> BrokerDescriptorBuilder {
        BrokerDescriptorBuilder::default()
    }

    /// Builds a descriptor from the absolute form of `layout`
    ///
    /// # Errors
    ///
    /// Returns an error if the layout paths cannot be made absolute
    pub fn from_layout(layout: &BrokerLayout) -> Result<Self> {
        let layout = layout.absolute()?;
        Self::builder()
            .with_data_folder(layout.data_dir())
            .with_configuration_folder(layout.config_dir())
            .with_extensions_folder(layout.extensions_dir())
            .build()
    }

    #[must_use]
    pub fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    #[must_use]
    pub fn configuration_folder(&self) -> &Path {
        &self.configuration_folder
    }

    #[must_use]
    pub fn extensions_folder(&self) -> &Path {
        &self.extensions_folder
    }
}

/// Builder for [`BrokerDescriptor`]
#[derive(Debug, Clone, Default)]
pub struct BrokerDescriptorBuilder {
    data_folder: Option<PathBuf>,
    configuration_folder: Option<PathBuf>,
    extensions_folder: Option<PathBuf>,
}

impl BrokerDescriptorBuilder {
    /// Sets the broker data folder
    #[must_use]
    pub fn with_data_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.data_folder = Some(folder.into());
        self
    }

    /// Sets the broker configuration folder
    #[must_use]
    pub fn with_configuration_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.configuration_folder = Some(folder.into());
        self
    }

    /// Sets the broker extensions folder
    #[must_use]
    pub fn with_extensions_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.extensions_folder = Some(folder.into());
        self
    }

    /// Builds the descriptor
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddedError::Configuration`] if a folder is unset or relative
    pub fn build(self) -> Result<BrokerDescriptor> {
        Ok(BrokerDescriptor {
            data_folder: require_absolute("data", self.data_folder)?,
            configuration_folder: require_absolute("configuration", self.configuration_folder)?,
            extensions_folder: require_absolute("extensions", self.extensions_folder)?,
        })
    }
}

fn require_absolute(name: &str, folder: Option<PathBuf>) -> Result<PathBuf> {
    let folder =
        folder.ok_or_else(|| EmbeddedError::Configuration(format!("{name} folder not set")))?;
    if !folder.is_absolute() {
        return Err(EmbeddedError::Configuration(format!(
            "{name} folder must be absolute: {}",
            folder.display()
        )));
    }
    Ok(folder)
}
