//! Identifier and clock sources used to stamp new envelopes.
//!
//! The hub itself never generates identifiers or timestamps; callers build
//! envelopes through an [`EventFactory`] wired with whatever sources they
//! need (deterministic ones in tests, for instance).

use crate::event::{EnvelopeBuilder, Event, EventEnvelope};
use crate::Result;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Source of unique event identifiers.
///
/// Implementations should produce collision-resistant, ideally
/// time-sortable strings.
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier
    fn next_id(&self) -> String;
}

/// Source of UTC timestamps.
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Time-ordered UUID v7 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Wall clock backed by [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds envelopes from an injected identifier generator and clock.
#[derive(Clone)]
pub struct EventFactory {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl EventFactory {
    /// Create a factory from explicit sources
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// Start an envelope with a fresh identifier and timestamp
    pub fn builder(&self, event_type: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder::new(self.ids.next_id(), event_type, self.clock.now())
    }

    /// Create an envelope carrying `payload`
    pub fn event<P>(&self, event_type: impl Into<String>, payload: P) -> Result<EventEnvelope>
    where
        P: Any + Send + Sync,
    {
        self.builder(event_type).payload(payload).build()
    }

    /// Create an envelope without a payload
    pub fn empty(&self, event_type: impl Into<String>) -> Result<EventEnvelope> {
        self.builder(event_type).build()
    }

    /// Create an envelope from a typed event, classified by [`Event::event_type`]
    pub fn typed<T: Event>(&self, event: T) -> Result<EventEnvelope> {
        self.builder(T::event_type())
            .shared_payload(event.into_payload())
            .build()
    }
}

impl Default for EventFactory {
    fn default() -> Self {
        Self::new(Arc::new(UuidV7Generator), Arc::new(SystemClock))
    }
}

impl fmt::Debug for EventFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFactory").finish_non_exhaustive()
    }
}
