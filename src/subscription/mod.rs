//! Subscription channels: per-consumer bounded, closable event streams.
//!
//! A channel is shared between the dispatcher's registry (through
//! [`SubscriptionHandle`]s) and its consumer (through a [`Subscription`]).
//! Its state is guarded by its own short-held lock, independent of the
//! registry lock, so a contended subscriber never blocks fan-out to others.

use crate::EventEnvelope;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;
use uuid::Uuid;

pub mod handle;
pub(crate) mod observer;

pub use handle::{Subscription, SubscriptionHandle};
pub use tokio::sync::mpsc::error::TryRecvError;

/// Outcome of offering one event to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The event was buffered
    Delivered,
    /// The buffer was full and the event was discarded
    Dropped,
    /// The subscriber is closed
    Closed,
}

/// Shared state of one subscription.
///
/// The sender slot doubles as the closed flag: `None` means closed. Push and
/// queries take the shared lock, close takes the exclusive one.
pub(crate) struct SubscriptionChannel {
    id: Uuid,
    hub_id: Uuid,
    capacity: usize,
    sender: RwLock<Option<mpsc::Sender<EventEnvelope>>>,
    closed: CancellationToken,
}

impl SubscriptionChannel {
    /// Allocate an open channel with room for `capacity` events (at least one).
    pub(crate) fn new(hub_id: Uuid, capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let channel = Self {
            id: Uuid::new_v4(),
            hub_id,
            capacity,
            sender: RwLock::new(Some(tx)),
            closed: CancellationToken::new(),
        };

        (channel, rx)
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn hub_id(&self) -> Uuid {
        self.hub_id
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Offer an event without ever waiting.
    ///
    /// A full buffer discards the event; a closed channel ignores it.
    pub(crate) fn push(&self, event: EventEnvelope) -> Delivery {
        let sender = self.sender.read();
        let Some(tx) = sender.as_ref() else {
            return Delivery::Closed;
        };

        match tx.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(event)) => {
                trace!(
                    subscription_id = %self.id,
                    event_id = %event.id(),
                    "Subscriber buffer full, dropping event"
                );
                Delivery::Dropped
            }
            // The consumer side is gone; nobody will ever read this.
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Close the channel. Returns `true` only for the call that closed it.
    ///
    /// Dropping the sender lets the consumer drain what is buffered and then
    /// observe end-of-stream.
    pub(crate) fn close(&self) -> bool {
        let previous = self.sender.write().take();
        if previous.is_none() {
            return false;
        }
        drop(previous);

        self.closed.cancel();
        trace!(subscription_id = %self.id, "Subscription closed");
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Token cancelled once the channel is closed
    pub(crate) fn closed_token(&self) -> &CancellationToken {
        &self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(id: &str) -> EventEnvelope {
        EventEnvelope::new(id, "TestEvent", Utc::now(), id.to_string()).unwrap()
    }

    #[test]
    fn test_push_and_receive() {
        let (channel, mut rx) = SubscriptionChannel::new(Uuid::nil(), 4);

        assert!(!channel.is_closed());
        assert_eq!(channel.push(event("e1")), Delivery::Delivered);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.id(), "e1");
    }

    #[test]
    fn test_full_buffer_drops_silently() {
        let (channel, mut rx) = SubscriptionChannel::new(Uuid::nil(), 2);

        assert_eq!(channel.push(event("e1")), Delivery::Delivered);
        assert_eq!(channel.push(event("e2")), Delivery::Delivered);
        assert_eq!(channel.push(event("e3")), Delivery::Dropped);

        assert_eq!(rx.try_recv().unwrap().id(), "e1");
        assert_eq!(rx.try_recv().unwrap().id(), "e2");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (channel, _rx) = SubscriptionChannel::new(Uuid::nil(), 1);

        assert!(channel.close());
        assert!(!channel.close());
        assert!(channel.is_closed());
        assert!(channel.closed_token().is_cancelled());
    }

    #[test]
    fn test_push_after_close_has_no_effect() {
        let (channel, mut rx) = SubscriptionChannel::new(Uuid::nil(), 4);
        channel.push(event("before"));
        channel.close();

        assert_eq!(channel.push(event("after")), Delivery::Closed);

        // Buffered events stay readable, then the stream ends.
        assert_eq!(rx.try_recv().unwrap().id(), "before");
        assert_eq!(
            rx.try_recv().unwrap_err(),
            mpsc::error::TryRecvError::Disconnected
        );
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (channel, _rx) = SubscriptionChannel::new(Uuid::nil(), 0);
        assert_eq!(channel.capacity(), 1);
        assert_eq!(channel.push(event("e1")), Delivery::Delivered);
    }

    #[test]
    fn test_push_to_dropped_receiver() {
        let (channel, rx) = SubscriptionChannel::new(Uuid::nil(), 1);
        drop(rx);
        assert_eq!(channel.push(event("e1")), Delivery::Closed);
    }
}
