//! Builder pattern for constructing Hub instances.

use crate::dispatcher::{Dispatcher, WorkerConfig, WorkerPool};
use crate::hub::config::HubConfig;
use crate::{Error, Hub, Result};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;
use uuid::Uuid;

/// Builder for creating Hub instances
#[derive(Debug, Default)]
pub struct HubBuilder {
    config: HubConfig,
    runtime: Option<Handle>,
}

impl HubBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the hub
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(HubConfig) -> HubConfig,
    {
        self.config = f(self.config);
        self
    }

    /// Set the buffer capacity of each subscription
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.config.subscriber_capacity = capacity;
        self
    }

    /// Set the number of asynchronous dispatch workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers.workers = workers;
        self
    }

    /// Set the capacity of the asynchronous dispatch queue
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.workers.queue_capacity = capacity;
        self
    }

    /// Set the pause each worker takes after a dispatch
    pub fn dispatch_delay(mut self, delay: Duration) -> Self {
        self.config.workers.dispatch_delay = delay;
        self
    }

    /// Replace the whole worker configuration
    pub fn worker_config(mut self, workers: WorkerConfig) -> Self {
        self.config.workers = workers;
        self
    }

    /// Spawn background tasks on this runtime instead of the current one
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build with high-throughput configuration
    pub fn high_throughput(self) -> Self {
        self.config(HubConfig::high_throughput())
    }

    /// Build the Hub and start its workers
    pub fn build(self) -> Result<Hub> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        let id = Uuid::new_v4();
        let dispatcher = Arc::new(Dispatcher::new());
        let workers = Arc::new(WorkerPool::start(
            &self.config.workers,
            dispatcher.clone(),
            &runtime,
        ));

        info!(
            hub_id = %id,
            subscriber_capacity = self.config.subscriber_capacity,
            workers = self.config.workers.workers,
            "Hub built"
        );

        Ok(Hub {
            id,
            config: Arc::new(self.config),
            dispatcher,
            workers,
            closed: Arc::new(AtomicBool::new(false)),
            runtime,
        })
    }
}
