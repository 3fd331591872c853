//! # event-hub
//!
//! An in-process publish/subscribe event hub built on Tokio.
//!
//! ## Features
//!
//! - **Type-classified** routing: subscribe to named event types or to everything
//! - **Non-blocking** publishing: producers are never slowed by consumers
//! - **Lossy** delivery: full buffers drop events instead of applying backpressure
//! - **Async dispatch** through a fixed worker pool with its own bounded queue
//! - **Cancellation-aware** subscriptions that close when their token fires
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use event_hub::{EventFactory, Hub};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create the hub
//!     let hub = Hub::builder().subscriber_capacity(128).build()?;
//!     let events = EventFactory::default();
//!
//!     // Subscribe to one event type
//!     let token = CancellationToken::new();
//!     let mut sub = hub.subscribe(&token, &["UserRegistered"])?;
//!
//!     // Publish events
//!     hub.publish(events.event("UserRegistered", "user@example.com")?)?;
//!     hub.publish_async(events.event("UserRegistered", "other@example.com")?)?;
//!
//!     let consumer = tokio::spawn(async move {
//!         while let Some(event) = sub.recv().await {
//!             println!("{}: {:?}", event.id(), event.payload::<&str>());
//!         }
//!     });
//!
//!     // Drains queued events, then closes every subscription
//!     hub.shutdown().await?;
//!     consumer.await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    unreachable_pub
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Event envelopes, metadata and identifier sources
pub mod event;

/// Error types and result aliases
pub mod error;

/// Subscriber registry for type-to-subscriber mapping
pub mod registry;

/// Subscription channels and handles
pub mod subscription;

/// Event dispatcher and asynchronous worker pool
pub mod dispatcher;

/// The hub facade and its lifecycle
pub mod hub;

// Re-export commonly used types
pub use dispatcher::{Dispatcher, EventDispatcher};
pub use error::{Error, Result};
pub use event::{Event, EventEnvelope, EventFactory, EventMetadata};
pub use hub::{EventHub, Hub, HubBuilder, HubConfig};
pub use subscription::{Subscription, SubscriptionHandle};

/// Prelude module for convenient imports
///
/// # Example
/// ```rust
/// use event_hub::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::event::{Event, EventEnvelope, EventFactory};
    pub use crate::hub::{EventHub, Hub, HubBuilder};
    pub use crate::subscription::{Subscription, SubscriptionHandle};
    pub use tokio_util::sync::CancellationToken;
}
