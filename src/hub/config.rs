//! Configuration for the event hub.

use crate::dispatcher::WorkerConfig;
use crate::{Error, Result};
use std::time::Duration;

/// Configuration for the event hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Buffer capacity of each subscription
    pub subscriber_capacity: usize,

    /// Asynchronous dispatch worker pool
    pub workers: WorkerConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 64,
            workers: WorkerConfig::default(),
        }
    }
}

impl HubConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer capacity of each subscription
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity;
        self
    }

    /// Configure the worker pool
    pub fn worker_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(WorkerConfig) -> WorkerConfig,
    {
        self.workers = f(self.workers);
        self
    }

    /// Check that every capacity and count is usable
    pub fn validate(&self) -> Result<()> {
        if self.subscriber_capacity == 0 {
            return Err(Error::config("subscriber capacity must be at least 1"));
        }
        if self.workers.workers == 0 {
            return Err(Error::config("worker count must be at least 1"));
        }
        if self.workers.queue_capacity == 0 {
            return Err(Error::config("queue capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Preset configurations for common use cases
impl HubConfig {
    /// Configuration for high-throughput scenarios
    pub fn high_throughput() -> Self {
        Self::default()
            .subscriber_capacity(1_024)
            .worker_config(|w| {
                w.workers(num_cpus::get().max(1))
                    .queue_capacity(16_384)
                    .dispatch_delay(Duration::ZERO)
            })
    }

    /// Configuration for testing
    pub fn test() -> Self {
        Self::default()
            .subscriber_capacity(16)
            .worker_config(|w| w.workers(2).queue_capacity(32).name_prefix("test-worker"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.subscriber_capacity, 64);
        assert_eq!(config.workers.workers, 4);
        assert_eq!(config.workers.queue_capacity, 256);
        assert_eq!(config.workers.dispatch_delay, Duration::from_micros(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero() {
        let err = HubConfig::new().subscriber_capacity(0).validate().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = HubConfig::new()
            .worker_config(|w| w.workers(0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = HubConfig::new()
            .worker_config(|w| w.queue_capacity(0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_presets_are_valid() {
        let fast = HubConfig::high_throughput();
        assert!(fast.validate().is_ok());
        assert!(fast.workers.dispatch_delay.is_zero());
        assert!(fast.workers.workers >= 1);

        let test = HubConfig::test();
        assert!(test.validate().is_ok());
        assert_eq!(test.workers.name_prefix, "test-worker");
    }
}
