//! Core event types.
//!
//! This module defines the [`EventEnvelope`] carried through the hub, the
//! optional typed [`Event`] trait, and the injected identifier and clock
//! sources used to stamp new envelopes.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

pub mod envelope;
pub mod metadata;
pub mod source;

pub use envelope::{EnvelopeBuilder, EventEnvelope};
pub use metadata::{EventMetadata, MetadataBuilder};
pub use source::{Clock, EventFactory, IdGenerator, SystemClock, UuidV7Generator};

/// Type-erased, shareable event payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Trait for Rust types that carry their own type classifier.
///
/// Implementing it lets an [`EventFactory`] build envelopes straight from a
/// value, using [`Event::event_type`] as the routing key.
///
/// # Example
///
/// ```rust
/// use event_hub::Event;
///
/// #[derive(Debug, Clone)]
/// struct OrderPlaced {
///     order_id: u64,
/// }
///
/// impl Event for OrderPlaced {
///     fn event_type() -> &'static str {
///         "OrderPlaced"
///     }
/// }
///
/// assert_eq!(OrderPlaced::event_type(), "OrderPlaced");
/// ```
pub trait Event: Send + Sync + Debug + 'static {
    /// Returns the type classifier used for routing.
    ///
    /// It should be a stable, non-empty identifier for the event type.
    fn event_type() -> &'static str
    where
        Self: Sized;

    /// Convert this event into a type-erased payload.
    fn into_payload(self) -> Payload
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}
