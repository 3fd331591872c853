//! Key/value metadata attached to envelopes.

use std::collections::HashMap;

/// Optional string metadata carried by an [`EventEnvelope`](super::EventEnvelope).
///
/// Values are never mutated in place once attached to an envelope: adding a
/// pair through [`EventMetadata::with`] yields a new map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMetadata {
    entries: HashMap<String, String>,
}

impl EventMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this metadata with one more pair.
    ///
    /// An existing value under the same key is replaced in the copy.
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), value.into());
        Self { entries }
    }

    /// Get a metadata value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Check whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is no metadata at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EventMetadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Builder for EventMetadata
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    entries: HashMap<String, String>,
}

impl MetadataBuilder {
    /// Create a new metadata builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Set the source that generated the event
    pub fn source(self, source: impl Into<String>) -> Self {
        self.entry("source", source)
    }

    /// Set a correlation identifier for tracing related events
    pub fn correlation_id(self, id: impl Into<String>) -> Self {
        self.entry("correlation_id", id)
    }

    /// Build the metadata
    pub fn build(self) -> EventMetadata {
        EventMetadata {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_with_returns_copy() {
        let base = EventMetadata::new().with("env", "test");
        let extended = base.with("region", "eu");

        assert_eq!(base.len(), 1);
        assert!(!base.contains_key("region"));
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.get("env"), Some("test"));
        assert_eq!(extended.get("region"), Some("eu"));
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = MetadataBuilder::new()
            .source("billing")
            .correlation_id("req-42")
            .entry("environment", "test")
            .build();

        assert_eq!(metadata.get("source"), Some("billing"));
        assert_eq!(metadata.get("correlation_id"), Some("req-42"));
        assert_eq!(metadata.get("environment"), Some("test"));
        assert_eq!(metadata.get("missing"), None);
    }

    #[test]
    fn test_metadata_from_iter() {
        let metadata: EventMetadata = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(metadata.len(), 2);
        assert!(metadata.iter().any(|(k, v)| k == "b" && v == "2"));
    }
}
