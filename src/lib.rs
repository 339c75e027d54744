//! # Embedded MQTT v5.0 Broker Supervisor
//!
//! Runs an MQTT v5.0 broker inside a host application and owns its lifecycle:
//! provisioning the broker's directories, starting it, tracking whether it
//! runs, and shutting it down.
//!
//! ## Layout
//!
//! ```text
//! <base>/            configuration folder, `mqtt-embedded` by default
//!   data/            broker storage
//!   conf/            broker configuration (`broker.json`)
//!   extensions/      broker extensions
//! ```
//!
//! The directories are created when the supervisor is constructed. Construction
//! is the only place an error surfaces; start and stop failures are logged and
//! reported through [`BrokerSupervisor::status`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use mqtt5_embedded::BrokerSupervisor;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = BrokerSupervisor::new(Some(Path::new("/var/lib/broker")))?;
//!
//!     supervisor.start().await;
//!     if !supervisor.is_server_running() {
//!         eprintln!("broker failed: {}", supervisor.status());
//!     }
//!
//!     tokio::signal::ctrl_c().await?;
//!     supervisor.stop().await;
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod layout;
pub mod status;
pub mod supervisor;

pub use config::SupervisorConfig;
pub use descriptor::{BrokerDescriptor, BrokerDescriptorBuilder};
pub use engine::{
    BrokerEngine, EngineFactory, MockCall, MockEngine, MockEngineFactory, Mqtt5Engine,
    Mqtt5EngineFactory,
};
pub use error::{EmbeddedError, Result};
pub use layout::{BrokerLayout, CONF_DIR, DATA_DIR, DEFAULT_BASE_DIR, EXTENSIONS_DIR};
pub use status::BrokerStatus;
pub use supervisor::BrokerSupervisor;
