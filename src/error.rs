use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddedError>;

/// Embedded broker supervisor errors
///
/// # Error Categories
///
/// - **Provisioning**: `Provisioning`, `Io`
/// - **Configuration**: `Configuration`
/// - **Engine**: `Engine`, `Timeout`
/// - **Lifecycle**: `AlreadyRunning`, `InvalidState`
///
/// Only provisioning errors surface from supervisor construction. Start and stop
/// failures are recorded in the supervisor's status instead of being returned,
/// except through [`BrokerSupervisor::try_start`](crate::BrokerSupervisor::try_start).
///
/// # Examples
///
/// ```
/// use mqtt5_embedded::{EmbeddedError, Result};
///
/// fn check_port(port: u16) -> Result<u16> {
///     if port == 0 {
///         return Err(EmbeddedError::Configuration(
///             "port must be non-zero".to_string()
///         ));
///     }
///     Ok(port)
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum EmbeddedError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to provision directory {}: {reason}", .path.display())]
    Provisioning { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Broker engine error: {0}")]
    Engine(String),

    #[error("Broker already running")]
    AlreadyRunning,

    #[error("Broker {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<std::io::Error> for EmbeddedError {
    fn from(err: std::io::Error) -> Self {
        EmbeddedError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EmbeddedError {
    fn from(err: serde_json::Error) -> Self {
        EmbeddedError::Configuration(err.to_string())
    }
}

impl From<mqtt5::MqttError> for EmbeddedError {
    fn from(err: mqtt5::MqttError) -> Self {
        EmbeddedError::Engine(err.to_string())
    }
}
