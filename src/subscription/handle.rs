//! Handles to subscriptions: the shared control side and the consumer side.

use super::{Delivery, SubscriptionChannel};
use crate::EventEnvelope;
use futures::Stream;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

/// A cloneable reference to a subscription channel.
///
/// Identity is by reference: two handles are equal only if they point at
/// the same channel, regardless of their contents.
#[derive(Clone)]
pub struct SubscriptionHandle {
    channel: Arc<SubscriptionChannel>,
}

impl SubscriptionHandle {
    pub(crate) fn new(channel: SubscriptionChannel) -> Self {
        Self {
            channel: Arc::new(channel),
        }
    }

    /// Get the subscription ID
    pub fn id(&self) -> Uuid {
        self.channel.id()
    }

    /// Buffer capacity of this subscription
    pub fn capacity(&self) -> usize {
        self.channel.capacity()
    }

    /// Close the subscription.
    ///
    /// Idempotent: whichever close path gets here first wins, later calls
    /// do nothing. The registry entry, if any, is pruned lazily.
    pub fn close(&self) {
        self.channel.close();
    }

    /// Check whether the subscription is closed
    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Wait until the subscription is closed
    pub async fn closed(&self) {
        self.channel.closed_token().cancelled().await;
    }

    pub(crate) fn hub_id(&self) -> Uuid {
        self.channel.hub_id()
    }

    pub(crate) fn push(&self, event: EventEnvelope) -> Delivery {
        self.channel.push(event)
    }

    pub(crate) fn close_now(&self) -> bool {
        self.channel.close()
    }

    /// Address of the underlying channel, used as its identity key
    pub(crate) fn key(&self) -> *const () {
        Arc::as_ptr(&self.channel).cast()
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.channel, &other.channel)
    }
}

impl Eq for SubscriptionHandle {}

impl Hash for SubscriptionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription {}", self.id())
    }
}

/// The consumer side of a subscription.
///
/// Events arrive in a bounded buffer and are read with [`Subscription::recv`]
/// or through the [`Stream`] implementation. Once the subscription is
/// closed the remaining buffered events are still yielded, then the stream
/// ends for good.
///
/// Dropping a `Subscription` closes it.
pub struct Subscription {
    handle: SubscriptionHandle,
    receiver: mpsc::Receiver<EventEnvelope>,
}

impl Subscription {
    pub(crate) fn new(handle: SubscriptionHandle, receiver: mpsc::Receiver<EventEnvelope>) -> Self {
        Self { handle, receiver }
    }

    /// Control handle for this subscription
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Get the subscription ID
    pub fn id(&self) -> Uuid {
        self.handle.id()
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the subscription is closed and drained.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        self.receiver.recv().await
    }

    /// Receive the next event if one is already buffered.
    ///
    /// Fails with [`TryRecvError::Empty`] while the subscription is open but
    /// idle, and with [`TryRecvError::Disconnected`] once it is closed and
    /// drained.
    pub fn try_recv(&mut self) -> Result<EventEnvelope, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Close the subscription
    pub fn close(&self) {
        self.handle.close();
    }

    /// Check whether the subscription is closed
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

impl Stream for Subscription {
    type Item = EventEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handle", &self.handle)
            .finish()
    }
}
