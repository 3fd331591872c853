//! The main Hub implementation.
//!
//! The Hub is the primary interface for publishing and subscribing to
//! events. It composes the [`Dispatcher`] with the asynchronous
//! [`WorkerPool`] and owns the one-way open → closed lifecycle.

use crate::dispatcher::{Dispatcher, DispatcherStats, EventDispatcher, WorkerPool, WorkerStats};
use crate::subscription::observer::spawn_observer;
use crate::subscription::{Subscription, SubscriptionChannel, SubscriptionHandle};
use crate::{Error, EventEnvelope, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use uuid::Uuid;

pub mod builder;
pub mod config;

pub use builder::HubBuilder;
pub use config::HubConfig;

/// Public operations of an event hub.
///
/// [`Hub`] is the implementation shipped with this crate; the trait lets
/// callers substitute their own in tests.
#[async_trait]
pub trait EventHub: Send + Sync {
    /// Deliver `event` to matching subscribers before returning
    fn publish(&self, event: EventEnvelope) -> Result<()>;

    /// Queue `event` for delivery by the worker pool
    fn publish_async(&self, event: EventEnvelope) -> Result<()>;

    /// Open a subscription for `types`, or for every event if `types` is empty
    fn subscribe(&self, cancel: &CancellationToken, types: &[&str]) -> Result<Subscription>;

    /// Remove a subscription from the hub and close it
    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()>;

    /// Close the hub and every subscription
    async fn shutdown(&self) -> Result<()>;

    /// Whether the hub has been closed
    fn closed(&self) -> bool;
}

/// In-process publish/subscribe hub.
///
/// Cloning is cheap and every clone drives the same hub. Delivery is lossy:
/// a full subscriber buffer or a full dispatch queue silently
/// discards the event, and producers are never slowed down.
///
/// # Example
///
/// ```rust,no_run
/// use event_hub::{EventFactory, Hub};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> event_hub::Result<()> {
/// let hub = Hub::new()?;
/// let events = EventFactory::default();
/// let token = CancellationToken::new();
///
/// let mut sub = hub.subscribe(&token, &["OrderPlaced"])?;
/// hub.publish(events.event("OrderPlaced", 42u64)?)?;
///
/// let event = sub.recv().await.expect("event");
/// assert_eq!(event.payload::<u64>(), Some(&42));
///
/// hub.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Hub {
    pub(crate) id: Uuid,
    pub(crate) config: Arc<HubConfig>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) workers: Arc<WorkerPool>,
    pub(crate) closed: Arc<AtomicBool>,
    pub(crate) runtime: Handle,
}

impl Hub {
    /// Create a hub with the default configuration on the current runtime
    pub fn new() -> Result<Self> {
        HubBuilder::new().build()
    }

    /// Create a new Hub builder
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    /// Identifier of this hub
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration the hub was built with
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Publish synchronously.
    ///
    /// Every currently open matching subscriber has been offered the event
    /// when this returns. Offers never wait; a full buffer drops the event
    /// for that subscriber only.
    pub fn publish(&self, event: EventEnvelope) -> Result<()> {
        self.ensure_open()?;

        trace!(event_id = %event.id(), event_type = %event.event_type(), "Publishing event");
        self.dispatcher.dispatch(&event);
        Ok(())
    }

    /// Publish through the worker pool.
    ///
    /// Returns as soon as the event is queued, or dropped if the queue is
    /// full; neither case is reported as an error.
    pub fn publish_async(&self, event: EventEnvelope) -> Result<()> {
        self.ensure_open()?;

        trace!(event_id = %event.id(), event_type = %event.event_type(), "Queueing event");
        self.workers.enqueue(event);
        Ok(())
    }

    /// Subscribe to events of the given types, or to every event if `types`
    /// is empty.
    ///
    /// Firing `cancel` closes the subscription. Repeated types are
    /// registered once.
    pub fn subscribe(&self, cancel: &CancellationToken, types: &[&str]) -> Result<Subscription> {
        self.ensure_open()?;

        let (channel, receiver) =
            SubscriptionChannel::new(self.id, self.config.subscriber_capacity);
        let handle = SubscriptionHandle::new(channel);

        if types.is_empty() {
            self.dispatcher.add_all(handle.clone());
        } else {
            let mut seen = HashSet::new();
            for event_type in types.iter().filter(|t| seen.insert(**t)) {
                self.dispatcher.add(event_type, handle.clone());
            }
        }

        // Shutdown may have snapshotted the registry before we registered.
        if self.closed() {
            self.dispatcher.remove_all(&handle);
            handle.close();
            return Err(Error::HubClosed);
        }

        spawn_observer(&self.runtime, handle.clone(), cancel.clone());

        debug!(
            subscription_id = %handle.id(),
            types = ?types,
            "Subscription opened"
        );

        Ok(Subscription::new(handle, receiver))
    }

    /// Subscribe to every event
    pub fn subscribe_all(&self, cancel: &CancellationToken) -> Result<Subscription> {
        self.subscribe(cancel, &[])
    }

    /// Remove a subscription from every registry collection and close it.
    ///
    /// Fails with [`Error::InvalidSubscription`] if the handle belongs to
    /// another hub, and with [`Error::HubClosed`] after shutdown.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        if handle.hub_id() != self.id {
            return Err(Error::InvalidSubscription { id: handle.id() });
        }
        self.ensure_open()?;

        self.dispatcher.remove_all(handle);
        handle.close();

        debug!(subscription_id = %handle.id(), "Subscription removed");
        Ok(())
    }

    /// Shut the hub down.
    ///
    /// Marks the hub closed first so racing calls fail fast, then drains
    /// the dispatch queue and waits for the workers, then closes every
    /// subscription. A second call is a successful no-op.
    pub async fn shutdown(&self) -> Result<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(hub_id = %self.id, "Hub already closed");
            return Ok(());
        }

        info!(hub_id = %self.id, "Shutting down hub");

        self.workers.stop().await;

        let subscriptions = self.dispatcher.snapshot();
        let count = subscriptions.len();
        for sub in subscriptions {
            sub.close();
        }
        self.dispatcher.clear();

        info!(hub_id = %self.id, subscriptions = count, "Hub shutdown complete");
        Ok(())
    }

    /// Whether the hub has been closed
    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get statistics about the hub
    pub fn stats(&self) -> HubStats {
        HubStats {
            closed: self.closed(),
            dispatcher: self.dispatcher.stats(),
            workers: self.workers.stats(),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed() {
            return Err(Error::HubClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl EventHub for Hub {
    fn publish(&self, event: EventEnvelope) -> Result<()> {
        Hub::publish(self, event)
    }

    fn publish_async(&self, event: EventEnvelope) -> Result<()> {
        Hub::publish_async(self, event)
    }

    fn subscribe(&self, cancel: &CancellationToken, types: &[&str]) -> Result<Subscription> {
        Hub::subscribe(self, cancel, types)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        Hub::unsubscribe(self, handle)
    }

    async fn shutdown(&self) -> Result<()> {
        Hub::shutdown(self).await
    }

    fn closed(&self) -> bool {
        Hub::closed(self)
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.id)
            .field("closed", &self.closed())
            .field("config", &self.config)
            .finish()
    }
}

/// Statistics about the hub
#[derive(Debug, Clone)]
pub struct HubStats {
    /// Whether the hub is closed
    pub closed: bool,

    /// Dispatcher statistics
    pub dispatcher: DispatcherStats,

    /// Worker pool statistics
    pub workers: WorkerStats,
}

impl fmt::Display for HubStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hub Stats: {} subscriptions, {} event types, {} events dispatched, {} dropped",
            self.dispatcher.subscribers,
            self.dispatcher.event_types,
            self.dispatcher.events_dispatched,
            self.dispatcher.dropped + self.workers.dropped
        )
    }
}
