//! Error types for the event hub.

use thiserror::Error;
use uuid::Uuid;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for event-hub.
///
/// Every variant is terminal: nothing in the hub retries on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A publishing or registering operation was attempted after shutdown
    #[error("hub is closed")]
    HubClosed,

    /// Event construction was rejected
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// The subscription handle was not produced by this hub
    #[error("invalid subscription: {id}")]
    InvalidSubscription {
        /// Identifier of the rejected subscription
        id: Uuid,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// No Tokio runtime was available to spawn background tasks on
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl Error {
    /// Create an invalid event error with a custom message
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Error::InvalidEvent(msg.into())
    }

    /// Create a configuration error with a custom message
    pub fn config(msg: impl Into<String>) -> Self {
        Error::ConfigError(msg.into())
    }

    /// Check if this error indicates the hub has been shut down
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::HubClosed)
    }
}
