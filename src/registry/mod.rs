//! Subscriber registry mapping type classifiers to subscriptions.
//!
//! The registry is a plain container with no locking of its own; the
//! [`Dispatcher`](crate::dispatcher::Dispatcher) owns it behind a
//! reader/writer lock. A subscription may appear in several collections at
//! once (one per registered type, or the global list), so every full
//! traversal deduplicates by identity.

use crate::subscription::SubscriptionHandle;
use std::collections::{HashMap, HashSet};

/// Collections of subscribers, per type classifier and global.
#[derive(Debug, Default)]
pub struct Registry {
    /// Subscribers by type classifier, in registration order
    by_type: HashMap<String, Vec<SubscriptionHandle>>,

    /// Subscribers receiving every event, in registration order
    global: Vec<SubscriptionHandle>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sub` for events classified as `event_type`.
    ///
    /// Closed entries already in that collection are dropped first.
    pub fn add(&mut self, event_type: &str, sub: SubscriptionHandle) {
        let list = self.by_type.entry(event_type.to_owned()).or_default();
        list.retain(|s| !s.is_closed());
        list.push(sub);
    }

    /// Register `sub` for every event, dropping closed global entries first
    pub fn add_global(&mut self, sub: SubscriptionHandle) {
        self.global.retain(|s| !s.is_closed());
        self.global.push(sub);
    }

    /// Remove `sub` from the collection of `event_type`.
    ///
    /// Closed entries met on the way are dropped as well, and an emptied
    /// collection is pruned. Returns whether `sub` was found.
    pub fn remove(&mut self, event_type: &str, sub: &SubscriptionHandle) -> bool {
        let Some(list) = self.by_type.get_mut(event_type) else {
            return false;
        };

        let found = retain_except(list, sub);
        if list.is_empty() {
            self.by_type.remove(event_type);
        }
        found
    }

    /// Remove `sub` from every collection it appears in.
    ///
    /// Returns whether `sub` was registered anywhere.
    pub fn remove_all(&mut self, sub: &SubscriptionHandle) -> bool {
        let mut found = retain_except(&mut self.global, sub);

        self.by_type.retain(|_, list| {
            found |= retain_except(list, sub);
            !list.is_empty()
        });

        found
    }

    /// Subscribers an event of `event_type` should be offered to: global ones
    /// first, then those registered for the type.
    pub fn targets<'a>(
        &'a self,
        event_type: &str,
    ) -> impl Iterator<Item = &'a SubscriptionHandle> + 'a {
        let typed = self
            .by_type
            .get(event_type)
            .map(|list| list.as_slice())
            .unwrap_or_default();

        self.global.iter().chain(typed.iter())
    }

    /// Every registered subscriber exactly once
    pub fn unique(&self) -> Vec<SubscriptionHandle> {
        let mut seen = HashSet::new();
        self.global
            .iter()
            .chain(self.by_type.values().flatten())
            .filter(|sub| seen.insert(sub.key()))
            .cloned()
            .collect()
    }

    /// Number of distinct registered subscribers that are still open
    pub fn subscriber_count(&self) -> usize {
        let mut seen = HashSet::new();
        self.global
            .iter()
            .chain(self.by_type.values().flatten())
            .filter(|sub| !sub.is_closed() && seen.insert(sub.key()))
            .count()
    }

    /// Number of type classifiers with at least one subscriber
    pub fn event_type_count(&self) -> usize {
        self.by_type.len()
    }

    /// Number of entries registered for `event_type`
    pub fn subscription_count(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Number of global entries
    pub fn global_count(&self) -> usize {
        self.global.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.by_type.is_empty()
    }

    /// Remove everything, returning each former subscriber once
    pub fn clear(&mut self) -> Vec<SubscriptionHandle> {
        let drained = self.unique();
        self.global.clear();
        self.by_type.clear();
        drained
    }
}

/// Drop `sub` and any closed entries from `list`; report whether `sub` was there.
fn retain_except(list: &mut Vec<SubscriptionHandle>, sub: &SubscriptionHandle) -> bool {
    let mut found = false;
    list.retain(|s| {
        if s == sub {
            found = true;
            return false;
        }
        !s.is_closed()
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionChannel;
    use uuid::Uuid;

    fn sub() -> (SubscriptionHandle, tokio::sync::mpsc::Receiver<crate::EventEnvelope>) {
        let (channel, rx) = SubscriptionChannel::new(Uuid::nil(), 4);
        (SubscriptionHandle::new(channel), rx)
    }

    #[test]
    fn test_add_and_targets() {
        let mut registry = Registry::new();
        let (global, _g) = sub();
        let (typed, _t) = sub();

        registry.add_global(global.clone());
        registry.add("A", typed.clone());

        let a: Vec<_> = registry.targets("A").cloned().collect();
        assert_eq!(a, vec![global.clone(), typed]);

        let b: Vec<_> = registry.targets("B").cloned().collect();
        assert_eq!(b, vec![global]);
    }

    #[test]
    fn test_remove_prunes_empty_type() {
        let mut registry = Registry::new();
        let (s, _rx) = sub();

        registry.add("A", s.clone());
        assert_eq!(registry.event_type_count(), 1);

        assert!(registry.remove("A", &s));
        assert_eq!(registry.event_type_count(), 0);
        assert!(registry.is_empty());

        assert!(!registry.remove("A", &s));
    }

    #[test]
    fn test_remove_all_purges_every_collection() {
        let mut registry = Registry::new();
        let (s, _rx) = sub();
        let (other, _orx) = sub();

        registry.add("A", s.clone());
        registry.add("B", s.clone());
        registry.add("B", other.clone());
        registry.add_global(s.clone());

        assert!(registry.remove_all(&s));

        assert_eq!(registry.global_count(), 0);
        assert_eq!(registry.subscription_count("A"), 0);
        assert_eq!(registry.subscription_count("B"), 1);
        assert_eq!(registry.event_type_count(), 1);
        assert_eq!(registry.unique(), vec![other]);
    }

    #[test]
    fn test_unique_deduplicates_by_identity() {
        let mut registry = Registry::new();
        let (s, _rx) = sub();
        let (other, _orx) = sub();

        registry.add("A", s.clone());
        registry.add("B", s.clone());
        registry.add_global(other.clone());

        let unique = registry.unique();
        assert_eq!(unique.len(), 2);
        assert!(unique.contains(&s));
        assert!(unique.contains(&other));
        assert_eq!(registry.subscriber_count(), 2);
    }

    #[test]
    fn test_closed_entries_pruned_lazily() {
        let mut registry = Registry::new();
        let (cancelled, _c) = sub();
        let (removed, _r) = sub();
        let (kept, _k) = sub();

        registry.add("A", cancelled.clone());
        registry.add("A", removed.clone());
        registry.add("A", kept.clone());

        cancelled.close();
        assert_eq!(registry.subscription_count("A"), 3);

        registry.remove("A", &removed);
        let remaining: Vec<_> = registry.targets("A").cloned().collect();
        assert_eq!(remaining, vec![kept]);
    }

    #[test]
    fn test_add_drops_closed_entries() {
        let mut registry = Registry::new();
        let mut receivers = Vec::new();

        for _ in 0..100 {
            let (typed, rx) = sub();
            registry.add("A", typed.clone());
            typed.close();
            receivers.push(rx);

            let (global, rx) = sub();
            registry.add_global(global.clone());
            global.close();
            receivers.push(rx);
        }

        assert_eq!(registry.subscription_count("A"), 1);
        assert_eq!(registry.global_count(), 1);
        assert_eq!(registry.subscriber_count(), 0);

        let (open, _rx) = sub();
        registry.add("A", open.clone());
        assert_eq!(registry.targets("A").cloned().collect::<Vec<_>>(), vec![open]);
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_clear_drains_once() {
        let mut registry = Registry::new();
        let (s, _rx) = sub();

        registry.add("A", s.clone());
        registry.add_global(s.clone());

        assert_eq!(registry.clear(), vec![s]);
        assert!(registry.is_empty());
    }
}
