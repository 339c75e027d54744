//! Mock broker engine for testing
//!
//! The factory and every engine it builds share one state, so calls made by a
//! supervisor can be inspected through the factory handle kept by the test.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::descriptor::BrokerDescriptor;
use crate::engine::{BrokerEngine, EngineFactory};
use crate::error::Result;

/// Record of a call made on the mock factory or one of its engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Build { engine: usize },
    Start { engine: usize },
    Stop { engine: usize },
    Close { engine: usize },
}

/// Configured responses for mock calls
#[derive(Debug, Default, Clone)]
pub struct MockResponses {
    /// Response for build calls
    pub build_response: Option<Result<()>>,
    /// Response for start calls
    pub start_response: Option<Result<()>>,
    /// Response for stop calls
    pub stop_response: Option<Result<()>>,
    /// Response for close calls
    pub close_response: Option<Result<()>>,
    /// Time a start takes before responding
    pub start_delay: Option<Duration>,
    /// Time a stop takes before responding
    pub stop_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Mutex<Vec<MockCall>>,
    responses: Mutex<MockResponses>,
    built: AtomicUsize,
    running: AtomicUsize,
    last_descriptor: Mutex<Option<BrokerDescriptor>>,
}

impl MockState {
    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    fn responses(&self) -> MockResponses {
        lock(&self.responses).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock engine factory
#[derive(Debug, Clone, Default)]
pub struct MockEngineFactory {
    state: Arc<MockState>,
}

impl MockEngineFactory {
    /// Creates a factory whose engines succeed at everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets all recorded calls
    #[must_use]
    pub fn get_calls(&self) -> Vec<MockCall> {
        lock(&self.state.calls).clone()
    }

    /// Clears all recorded calls
    pub fn clear_calls(&self) {
        lock(&self.state.calls).clear();
    }

    /// Number of engines built so far
    #[must_use]
    pub fn built_count(&self) -> usize {
        self.state.built.load(Ordering::SeqCst)
    }

    /// Number of engines started and not yet stopped or released
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Descriptor passed to the most recent build
    #[must_use]
    pub fn last_descriptor(&self) -> Option<BrokerDescriptor> {
        lock(&self.state.last_descriptor).clone()
    }

    /// Configures the response for build calls
    pub fn set_build_response(&self, response: Result<()>) {
        lock(&self.state.responses).build_response = Some(response);
    }

    /// Configures the response for start calls
    pub fn set_start_response(&self, response: Result<()>) {
        lock(&self.state.responses).start_response = Some(response);
    }

    /// Configures the response for stop calls
    pub fn set_stop_response(&self, response: Result<()>) {
        lock(&self.state.responses).stop_response = Some(response);
    }

    /// Configures the response for close calls
    pub fn set_close_response(&self, response: Result<()>) {
        lock(&self.state.responses).close_response = Some(response);
    }

    /// Makes every start wait before responding
    pub fn set_start_delay(&self, delay: Duration) {
        lock(&self.state.responses).start_delay = Some(delay);
    }

    /// Makes every stop wait before responding
    pub fn set_stop_delay(&self, delay: Duration) {
        lock(&self.state.responses).stop_delay = Some(delay);
    }

    /// Restores the default succeed-at-everything behavior
    pub fn reset_responses(&self) {
        *lock(&self.state.responses) = MockResponses::default();
    }
}

impl EngineFactory for MockEngineFactory {
    type Engine = MockEngine;

    fn build(&self, descriptor: &BrokerDescriptor) -> Result<MockEngine> {
        let id = self.state.built.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.record(MockCall::Build { engine: id });
        *lock(&self.state.last_descriptor) = Some(descriptor.clone());

        if let Some(response) = self.state.responses().build_response {
            response?;
        }

        Ok(MockEngine {
            id,
            state: Arc::clone(&self.state),
            started: false,
        })
    }
}

/// Mock engine built by [`MockEngineFactory`]
#[derive(Debug)]
pub struct MockEngine {
    id: usize,
    state: Arc<MockState>,
    started: bool,
}

impl MockEngine {
    /// Sequence number of this engine, starting at 1
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    fn release(&mut self) {
        if self.started {
            self.started = false;
            self.state.running.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl BrokerEngine for MockEngine {
    fn start(&mut self) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            self.state.record(MockCall::Start { engine: self.id });
            let responses = self.state.responses();

            if let Some(delay) = responses.start_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(response) = responses.start_response {
                response?;
            }

            if !self.started {
                self.started = true;
                self.state.running.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn stop(&mut self) -> impl Future<Output = Result<()>> + Send + '_ {
        async move {
            self.state.record(MockCall::Stop { engine: self.id });
            let responses = self.state.responses();

            if let Some(delay) = responses.stop_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(response) = responses.stop_response {
                response?;
            }

            self.release();
            Ok(())
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state.record(MockCall::Close { engine: self.id });
        self.release();

        match self.state.responses().close_response {
            Some(response) => response,
            None => Ok(()),
        }
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.release();
    }
}
