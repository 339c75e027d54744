//! Embedded broker supervisor
//!
//! [`BrokerSupervisor`] provisions the broker layout on construction and then
//! drives one engine per start cycle:
//!
//! ```text
//! Stopped --start ok--> Running --stop--> Stopped
//!    |                     ^
//!    +--start err--> Failed --start ok--+
//! ```
//!
//! Start and stop never fail outward. Failures are logged and recorded in the
//! supervisor's [`BrokerStatus`]; stop always ends in `Stopped` even when the
//! engine does not shut down cleanly.

use crate::config::SupervisorConfig;
use crate::descriptor::BrokerDescriptor;
use crate::engine::{BrokerEngine, EngineFactory, Mqtt5EngineFactory};
use crate::error::{EmbeddedError, Result};
use crate::layout::BrokerLayout;
use crate::status::BrokerStatus;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

/// Owns the lifecycle of one embedded broker
pub struct BrokerSupervisor<F: EngineFactory = Mqtt5EngineFactory> {
    config: SupervisorConfig,
    layout: BrokerLayout,
    descriptor: BrokerDescriptor,
    factory: F,
    /// Held for the whole of every transition, so start, stop and restart
    /// never interleave
    instance: Mutex<Option<F::Engine>>,
    status: watch::Sender<BrokerStatus>,
}

impl BrokerSupervisor {
    /// Creates a supervisor for an in-process `mqtt5` broker rooted at
    /// `config_folder`, or at `mqtt-embedded` when none is given
    ///
    /// # Errors
    ///
    /// Returns an error if the broker directories cannot be created
    pub fn new(config_folder: Option<&Path>) -> Result<Self> {
        let config = SupervisorConfig {
            config_folder: config_folder.map(Path::to_path_buf),
            ..SupervisorConfig::default()
        };
        Self::with_factory(config, Mqtt5EngineFactory::default())
    }
}

impl<F: EngineFactory> BrokerSupervisor<F> {
    /// Creates a supervisor that builds its engines with `factory`
    ///
    /// The data, configuration and extensions directories exist once this
    /// returns. No broker is started.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the broker
    /// directories cannot be created
    pub fn with_factory(config: SupervisorConfig, factory: F) -> Result<Self> {
        config.validate()?;

        let layout = BrokerLayout::resolve(config.config_folder.as_deref());
        let descriptor = BrokerDescriptor::from_layout(&layout)?;
        layout.provision()?;
        info!(
            "Embedded MQTT broker provisioned at {}",
            layout.base().display()
        );

        let (status, _) = watch::channel(BrokerStatus::Stopped);

        Ok(Self {
            config,
            layout,
            descriptor,
            factory,
            instance: Mutex::new(None),
            status,
        })
    }

    /// Builds and starts a broker, waiting until the start completes
    ///
    /// Failures are logged and leave the supervisor not running; check
    /// [`is_server_running`](Self::is_server_running) or
    /// [`status`](Self::status) afterwards. Calling this while a broker is
    /// running leaves that broker untouched.
    pub async fn start(&self) {
        if let Err(EmbeddedError::AlreadyRunning) = self.try_start().await {
            warn!("Embedded MQTT broker already running, start ignored");
        }
    }

    /// Same transition as [`start`](Self::start), returning the failure cause
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddedError::AlreadyRunning`] if a broker is running, or
    /// the build or start failure otherwise
    pub async fn try_start(&self) -> Result<()> {
        let mut instance = self.instance.lock().await;
        if instance.is_some() {
            return Err(EmbeddedError::AlreadyRunning);
        }
        self.start_locked(&mut instance).await
    }

    /// Stops and releases the running broker, if any
    ///
    /// Stop and release failures are logged. The supervisor is not running
    /// afterwards either way.
    pub async fn stop(&self) {
        let mut instance = self.instance.lock().await;
        self.stop_locked(&mut instance).await;
    }

    /// Stops the running broker, if any, then starts a fresh one
    ///
    /// A failed start is logged and recorded in [`status`](Self::status).
    pub async fn restart(&self) {
        // Already logged and recorded by the start half.
        let _ = self.try_restart().await;
    }

    /// Same transition as [`restart`](Self::restart), returning the start
    /// failure cause
    ///
    /// # Errors
    ///
    /// Returns the build or start failure of the fresh broker
    pub async fn try_restart(&self) -> Result<()> {
        let mut instance = self.instance.lock().await;
        self.stop_locked(&mut instance).await;
        self.start_locked(&mut instance).await
    }

    /// Whether the last start succeeded and no stop followed
    #[must_use]
    pub fn is_server_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    #[must_use]
    pub fn status(&self) -> BrokerStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every lifecycle transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BrokerStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn layout(&self) -> &BrokerLayout {
        &self.layout
    }

    #[must_use]
    pub fn descriptor(&self) -> &BrokerDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    async fn start_locked(&self, slot: &mut Option<F::Engine>) -> Result<()> {
        match self.launch().await {
            Ok(engine) => {
                *slot = Some(engine);
                self.status.send_replace(BrokerStatus::Running);
                info!("Embedded MQTT broker started successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to start embedded MQTT broker: {}", e);
                self.status.send_replace(BrokerStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<F::Engine> {
        let mut engine = self.factory.build(&self.descriptor)?;

        let started = bounded(self.config.start_timeout, "start", engine.start()).await;
        if let Err(e) = started {
            if let Err(close_err) = engine.close() {
                warn!("Failed to release broker after failed start: {}", close_err);
            }
            return Err(e);
        }

        Ok(engine)
    }

    async fn stop_locked(&self, slot: &mut Option<F::Engine>) {
        let Some(mut engine) = slot.take() else {
            return;
        };

        let stopped = bounded(self.config.stop_timeout, "stop", engine.stop()).await;
        if let Err(e) = stopped {
            error!("Failed to stop embedded MQTT broker: {}", e);
        }
        if let Err(e) = engine.close() {
            error!("Failed to release embedded MQTT broker: {}", e);
        }
        drop(engine);

        self.status.send_replace(BrokerStatus::Stopped);
        info!("Embedded MQTT broker stopped");
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| EmbeddedError::Timeout { operation, after })?,
        None => fut.await,
    }
}
