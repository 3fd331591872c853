//! Immutable envelope for events routed through the hub.

use crate::event::{EventMetadata, Payload};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An immutable message carried by the hub.
///
/// The identifier and timestamp are supplied by the caller (usually through
/// an [`EventFactory`](super::EventFactory)); the hub never generates them.
/// The type classifier is guaranteed non-empty. Cloning is cheap for the
/// payload, which is shared behind an `Arc`.
#[derive(Clone)]
pub struct EventEnvelope {
    id: String,
    event_type: String,
    timestamp: DateTime<Utc>,
    payload: Option<Payload>,
    metadata: EventMetadata,
}

impl EventEnvelope {
    /// Create an envelope carrying `payload`.
    ///
    /// Fails with [`Error::InvalidEvent`] if `event_type` is empty.
    pub fn new<P>(
        id: impl Into<String>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: P,
    ) -> Result<Self>
    where
        P: Any + Send + Sync,
    {
        EnvelopeBuilder::new(id, event_type, timestamp)
            .payload(payload)
            .build()
    }

    /// Start building an envelope
    pub fn builder(
        id: impl Into<String>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> EnvelopeBuilder {
        EnvelopeBuilder::new(id, event_type, timestamp)
    }

    /// Get the event identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the type classifier
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Get the creation timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the metadata
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Whether a payload is present
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Try to downcast the payload to a specific type
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.downcast_ref::<T>()
    }

    /// Clone the type-erased payload
    pub fn clone_payload(&self) -> Option<Payload> {
        self.payload.clone()
    }

    /// Return a new envelope with one more metadata pair.
    ///
    /// `self` is left untouched.
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            metadata: self.metadata.with(key, value),
            ..self.clone()
        }
    }
}

impl fmt::Debug for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEnvelope")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("timestamp", &self.timestamp)
            .field("has_payload", &self.payload.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Builder for creating event envelopes
#[derive(Debug)]
pub struct EnvelopeBuilder {
    id: String,
    event_type: String,
    timestamp: DateTime<Utc>,
    payload: Option<Payload>,
    metadata: EventMetadata,
}

impl EnvelopeBuilder {
    /// Create a new envelope builder
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            timestamp,
            payload: None,
            metadata: EventMetadata::new(),
        }
    }

    /// Set the payload
    pub fn payload<P: Any + Send + Sync>(mut self, payload: P) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Set an already type-erased payload
    pub fn shared_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Replace the metadata
    pub fn metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single metadata pair
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with(key, value);
        self
    }

    /// Build the envelope
    pub fn build(self) -> Result<EventEnvelope> {
        if self.event_type.is_empty() {
            return Err(Error::invalid_event("event type must not be empty"));
        }

        Ok(EventEnvelope {
            id: self.id,
            event_type: self.event_type,
            timestamp: self.timestamp,
            payload: self.payload,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEvent {
        id: u64,
    }

    #[test]
    fn test_envelope_creation() {
        let now = Utc::now();
        let envelope = EventEnvelope::new("evt-1", "TestEvent", now, TestEvent { id: 123 }).unwrap();

        assert_eq!(envelope.id(), "evt-1");
        assert_eq!(envelope.event_type(), "TestEvent");
        assert_eq!(envelope.timestamp(), now);
        assert!(envelope.has_payload());
        assert!(envelope.metadata().is_empty());
    }

    #[test]
    fn test_empty_type_rejected() {
        let err = EventEnvelope::new("evt-1", "", Utc::now(), 1u8).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));

        let err = EnvelopeBuilder::new("evt-2", String::new(), Utc::now())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
    }

    #[test]
    fn test_envelope_downcast() {
        let envelope = EventEnvelope::new("evt-1", "TestEvent", Utc::now(), TestEvent { id: 456 }).unwrap();

        assert_eq!(envelope.payload::<TestEvent>(), Some(&TestEvent { id: 456 }));
        assert!(envelope.payload::<String>().is_none());
    }

    #[test]
    fn test_envelope_without_payload() {
        let envelope = EnvelopeBuilder::new("evt-1", "Ping", Utc::now())
            .build()
            .unwrap();

        assert!(!envelope.has_payload());
        assert!(envelope.payload::<()>().is_none());
    }

    #[test]
    fn test_with_metadata_leaves_original_untouched() {
        let original = EnvelopeBuilder::new("evt-1", "TestEvent", Utc::now())
            .payload("hello")
            .meta("source", "tests")
            .build()
            .unwrap();

        let tagged = original.with_metadata("attempt", "2");

        assert_eq!(original.metadata().len(), 1);
        assert_eq!(original.metadata().get("attempt"), None);
        assert_eq!(tagged.metadata().get("attempt"), Some("2"));
        assert_eq!(tagged.metadata().get("source"), Some("tests"));
        assert_eq!(tagged.id(), original.id());
        assert_eq!(tagged.payload::<&str>(), Some(&"hello"));
    }
}
