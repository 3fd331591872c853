//! Observer tasks binding a subscription to an external cancellation signal.

use super::SubscriptionHandle;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Spawn a task that closes `subscription` when `signal` fires.
///
/// The task also ends as soon as the subscription is closed by any other
/// path, so no idle observer outlives its subscription. It never touches
/// the registry; closed entries are pruned lazily there.
pub(crate) fn spawn_observer(
    runtime: &Handle,
    subscription: SubscriptionHandle,
    signal: CancellationToken,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        tokio::select! {
            _ = signal.cancelled() => {
                if subscription.close_now() {
                    debug!(
                        subscription_id = %subscription.id(),
                        "Subscription closed by cancellation signal"
                    );
                }
            }
            _ = subscription.closed() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionChannel;
    use std::time::Duration;
    use uuid::Uuid;

    fn handle() -> (SubscriptionHandle, tokio::sync::mpsc::Receiver<crate::EventEnvelope>) {
        let (channel, rx) = SubscriptionChannel::new(Uuid::nil(), 1);
        (SubscriptionHandle::new(channel), rx)
    }

    #[tokio::test]
    async fn test_signal_closes_subscription() {
        let (sub, _rx) = handle();
        let signal = CancellationToken::new();
        let task = spawn_observer(&Handle::current(), sub.clone(), signal.clone());

        signal.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("observer did not finish")
            .unwrap();

        assert!(sub.is_closed());
    }

    #[tokio::test]
    async fn test_observer_exits_on_manual_close() {
        let (sub, _rx) = handle();
        let signal = CancellationToken::new();
        let task = spawn_observer(&Handle::current(), sub.clone(), signal.clone());

        sub.close();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("observer leaked after manual close")
            .unwrap();

        assert!(!signal.is_cancelled());
    }
}
