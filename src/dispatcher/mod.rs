//! Event dispatcher: subscriber registry plus fan-out routing.
//!
//! # Lock discipline
//!
//! The [`Registry`] lives behind one reader/writer lock. Registration and
//! removal take it exclusively; [`Dispatcher::dispatch`] and
//! [`Dispatcher::snapshot`] take it shared, so concurrent dispatches run in
//! parallel but never overlap a change to the registry's shape. Offering an
//! event to a subscriber only takes that subscriber's own lock and never
//! waits on the buffer.

use crate::registry::Registry;
use crate::subscription::{Delivery, SubscriptionHandle};
use crate::EventEnvelope;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

pub mod worker;

pub use worker::{WorkerConfig, WorkerPool, WorkerStats};

/// Trait for components that route events to subscribers.
///
/// Dispatching never blocks and never fails: closed or absent targets are
/// simply skipped.
pub trait EventDispatcher: Send + Sync {
    /// Offer `event` to every matching subscriber
    fn dispatch(&self, event: &EventEnvelope);
}

/// Statistics for the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Total events dispatched
    pub events_dispatched: u64,

    /// Events placed in a subscriber buffer
    pub deliveries: u64,

    /// Events discarded because a subscriber buffer was full
    pub dropped: u64,

    /// Distinct registered subscribers
    pub subscribers: usize,

    /// Type classifiers with at least one subscriber
    pub event_types: usize,
}

/// Registry of subscriptions and the fan-out routine.
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: RwLock<Registry>,
    events_dispatched: AtomicU64,
    deliveries: AtomicU64,
    dropped: AtomicU64,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sub` for events of `event_type`
    pub fn add(&self, event_type: &str, sub: SubscriptionHandle) {
        trace!(subscription_id = %sub.id(), event_type, "Registering subscription");
        self.registry.write().add(event_type, sub);
    }

    /// Register `sub` for all events
    pub fn add_all(&self, sub: SubscriptionHandle) {
        trace!(subscription_id = %sub.id(), "Registering global subscription");
        self.registry.write().add_global(sub);
    }

    /// Remove `sub` from the collection of `event_type`
    pub fn remove(&self, event_type: &str, sub: &SubscriptionHandle) -> bool {
        self.registry.write().remove(event_type, sub)
    }

    /// Remove `sub` from every collection
    pub fn remove_all(&self, sub: &SubscriptionHandle) -> bool {
        self.registry.write().remove_all(sub)
    }

    /// Every registered subscriber exactly once
    pub fn snapshot(&self) -> Vec<SubscriptionHandle> {
        self.registry.read().unique()
    }

    /// Empty the registry, returning each former subscriber once
    pub fn clear(&self) -> Vec<SubscriptionHandle> {
        self.registry.write().clear()
    }

    /// Number of entries registered for `event_type`
    pub fn subscription_count(&self, event_type: &str) -> usize {
        self.registry.read().subscription_count(event_type)
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStats {
        let registry = self.registry.read();
        DispatcherStats {
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            subscribers: registry.subscriber_count(),
            event_types: registry.event_type_count(),
        }
    }
}

impl EventDispatcher for Dispatcher {
    fn dispatch(&self, event: &EventEnvelope) {
        let registry = self.registry.read();
        let mut delivered = 0u64;
        let mut dropped = 0u64;

        for sub in registry.targets(event.event_type()) {
            if sub.is_closed() {
                continue;
            }
            match sub.push(event.clone()) {
                Delivery::Delivered => delivered += 1,
                Delivery::Dropped => dropped += 1,
                Delivery::Closed => {}
            }
        }
        drop(registry);

        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.dropped.fetch_add(dropped, Ordering::Relaxed);

        trace!(
            event_id = %event.id(),
            event_type = %event.event_type(),
            delivered,
            dropped,
            "Event dispatched"
        );
    }
}
