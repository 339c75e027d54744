//! Broker engine contract
//!
//! The supervisor never touches broker internals. It drives an engine through
//! two narrow traits:
//!
//! - [`EngineFactory`] builds one engine from a [`BrokerDescriptor`] per start cycle
//! - [`BrokerEngine`] is started, stopped and closed by the supervisor
//!
//! [`Mqtt5EngineFactory`] runs the `mqtt5` broker in-process. [`MockEngineFactory`]
//! records calls and fails on demand, for tests and for hosts that want to
//! exercise their lifecycle hooks without opening sockets.

pub mod mock;
pub mod mqtt;

pub use mock::{MockCall, MockEngine, MockEngineFactory};
pub use mqtt::{Mqtt5Engine, Mqtt5EngineFactory, BROKER_CONFIG_FILE};

use crate::descriptor::BrokerDescriptor;
use crate::error::Result;
use std::future::Future;

/// A single broker instance
pub trait BrokerEngine: Send + 'static {
    /// Starts the broker, resolving once it is ready to serve
    ///
    /// # Errors
    ///
    /// Returns an error if the broker cannot start
    fn start(&mut self) -> impl Future<Output = Result<()>> + Send + '_;

    /// Stops the broker, resolving once it no longer serves
    ///
    /// # Errors
    ///
    /// Returns an error if the broker does not stop cleanly
    fn stop(&mut self) -> impl Future<Output = Result<()>> + Send + '_;

    /// Releases resources still held by the broker
    ///
    /// # Errors
    ///
    /// Returns an error if resources cannot be released
    fn close(&mut self) -> Result<()>;
}

/// Builds broker instances from a descriptor
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: BrokerEngine;

    /// Builds a fresh, not yet started engine
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be configured
    fn build(&self, descriptor: &BrokerDescriptor) -> Result<Self::Engine>;
}
