//! In-process `mqtt5` broker engine
//!
//! The broker reads its settings from `<conf>/broker.json` when that file
//! exists. Otherwise it runs with `mqtt5` defaults on the factory's bind
//! address. Persistent storage always lives in the data folder.

use crate::descriptor::BrokerDescriptor;
use crate::engine::{BrokerEngine, EngineFactory};
use crate::error::{EmbeddedError, Result};
use crate::layout::BrokerLayout;
use ::mqtt5::broker::config::StorageBackend;
use ::mqtt5::broker::{BrokerConfig, MqttBroker};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Broker configuration file name inside the configuration folder
pub const BROKER_CONFIG_FILE: &str = "broker.json";

/// Listener address used when no broker configuration file exists
pub const DEFAULT_BIND_ADDRESS: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 1883);

/// Builds [`Mqtt5Engine`]s
#[derive(Debug, Clone)]
pub struct Mqtt5EngineFactory {
    bind_address: SocketAddr,
    persistence: bool,
}

impl Default for Mqtt5EngineFactory {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS,
            persistence: true,
        }
    }
}

impl Mqtt5EngineFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listener address used when no broker configuration file exists
    #[must_use]
    pub fn with_bind_address(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.bind_address = addr.into();
        self
    }

    /// Enables or disables persistence in the data folder
    #[must_use]
    pub fn with_persistence(mut self, enabled: bool) -> Self {
        self.persistence = enabled;
        self
    }

    #[must_use]
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Resolves the broker configuration for `descriptor`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed
    pub fn load_config(&self, descriptor: &BrokerDescriptor) -> Result<BrokerConfig> {
        let path = descriptor.configuration_folder().join(BROKER_CONFIG_FILE);

        let mut config = if path.is_file() {
            debug!("Loading broker configuration from {}", path.display());
            read_config(&path)?
        } else {
            debug!(
                "No broker configuration at {}, using defaults on {}",
                path.display(),
                self.bind_address
            );
            BrokerConfig::default().with_bind_address(self.bind_address)
        };

        config.storage_config.backend = StorageBackend::File;
        config.storage_config.base_dir = descriptor.data_folder().to_path_buf();
        config.storage_config.enable_persistence = self.persistence;

        Ok(config)
    }

    /// Writes a default `broker.json` into the layout's configuration folder.
    /// An existing file is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn write_default_config(&self, layout: &BrokerLayout) -> Result<PathBuf> {
        let path = layout.config_dir().join(BROKER_CONFIG_FILE);
        if path.exists() {
            info!("Keeping existing broker configuration {}", path.display());
            return Ok(path);
        }

        let config = BrokerConfig::default().with_bind_address(self.bind_address);
        let contents = serde_json::to_string_pretty(&config)?;
        std::fs::write(&path, contents)?;
        info!("Wrote default broker configuration {}", path.display());
        Ok(path)
    }
}

fn read_config(path: &Path) -> Result<BrokerConfig> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        EmbeddedError::Configuration(format!("Failed to parse {}: {e}", path.display()))
    })
}

impl EngineFactory for Mqtt5EngineFactory {
    type Engine = Mqtt5Engine;

    fn build(&self, descriptor: &BrokerDescriptor) -> Result<Mqtt5Engine> {
        let config = self.load_config(descriptor)?;
        debug!(
            "Extensions folder {} provisioned; mqtt5 loads no extensions",
            descriptor.extensions_folder().display()
        );
        Ok(Mqtt5Engine {
            config: Some(config),
            task: None,
        })
    }
}

/// An `mqtt5` broker running on the current tokio runtime
///
/// Stopping aborts the task driving `MqttBroker::run`, which closes the
/// listeners and the tasks tied to the broker's shutdown channel. The `$SYS`
/// topics publisher that `mqtt5` spawns from `run` has no shutdown hook and
/// outlives the engine, holding its router until the runtime exits. Each
/// start/stop cycle leaves one such task behind.
pub struct Mqtt5Engine {
    config: Option<BrokerConfig>,
    task: Option<JoinHandle<()>>,
}

impl Mqtt5Engine {
    /// Configuration this engine will start with, until it is started
    #[must_use]
    pub fn config(&self) -> Option<&BrokerConfig> {
        self.config.as_ref()
    }
}

impl BrokerEngine for Mqtt5Engine {
    fn start(&mut self) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            let Some(config) = self.config.take() else {
                return Err(EmbeddedError::InvalidState(
                    "Broker engine already started".to_string(),
                ));
            };

            // Listeners are bound here, so address conflicts fail the start.
            let mut broker = MqttBroker::with_config(config).await?;

            self.task = Some(tokio::spawn(async move {
                if let Err(e) = broker.run().await {
                    error!("Embedded broker exited with error: {}", e);
                }
            }));
            Ok(())
        }
    }

    fn stop(&mut self) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            let Some(task) = self.task.take() else {
                return Ok(());
            };

            // Aborting drops the broker's shutdown sender, ending the
            // listener and connection tasks. The $SYS publisher keeps running.
            task.abort();
            match task.await {
                Ok(()) => Ok(()),
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => Err(EmbeddedError::Engine(format!("Broker task failed: {e}"))),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.config = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for Mqtt5Engine {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
