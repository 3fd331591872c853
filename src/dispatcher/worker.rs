//! Worker pool decoupling asynchronous publication from delivery.
//!
//! A single bounded queue feeds a fixed set of workers. Enqueueing never
//! waits: when the queue is full the event is dropped. This is a separate
//! drop point from the per-subscriber buffers, and an event can be lost at
//! either one.

use super::EventDispatcher;
use crate::EventEnvelope;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Granularity of the Tokio timer
const TIMER_RESOLUTION: Duration = Duration::from_millis(1);

/// Configuration for the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of worker tasks
    pub workers: usize,

    /// Capacity of the shared input queue
    pub queue_capacity: usize,

    /// Pause after each dispatch, smoothing bursts towards subscribers.
    ///
    /// Below one millisecond the worker yields to the scheduler instead.
    /// Longer delays sleep and need a runtime with its time driver enabled.
    pub dispatch_delay: Duration,

    /// Worker name prefix, used in logs
    pub name_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            dispatch_delay: Duration::from_micros(50),
            name_prefix: "hub-worker".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the delay after each dispatch
    pub fn dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = delay;
        self
    }

    /// Set the worker name prefix
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }
}

/// Statistics for the worker pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Events accepted into the queue
    pub enqueued: u64,

    /// Events dropped because the queue was full or stopped
    pub dropped: u64,

    /// Events handed to the dispatcher by workers
    pub processed: u64,
}

/// A fixed pool of workers draining one bounded queue into a dispatcher.
pub struct WorkerPool {
    /// Sending side of the queue; `None` once stopped
    sender: Mutex<Option<mpsc::Sender<EventEnvelope>>>,

    /// Worker task handles, drained by the first `stop`
    handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,

    stopped: AtomicBool,
    enqueued: AtomicU64,
    dropped: AtomicU64,
    processed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create the queue and spawn the workers on `runtime`.
    ///
    /// Zero workers or a zero capacity are raised to one.
    pub fn start(
        config: &WorkerConfig,
        dispatcher: Arc<dyn EventDispatcher>,
        runtime: &Handle,
    ) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(rx));
        let processed = Arc::new(AtomicU64::new(0));

        info!(
            workers,
            queue_capacity = config.queue_capacity,
            "Starting worker pool"
        );

        let handles = (0..workers)
            .map(|i| {
                let name = format!("{}-{}", config.name_prefix, i);
                runtime.spawn(run_worker(
                    name,
                    receiver.clone(),
                    dispatcher.clone(),
                    config.dispatch_delay,
                    processed.clone(),
                ))
            })
            .collect();

        Self {
            sender: Mutex::new(Some(tx)),
            handles: tokio::sync::Mutex::new(handles),
            stopped: AtomicBool::new(false),
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            processed,
        }
    }

    /// Try to queue `event` without waiting.
    ///
    /// Returns `false` if the event was dropped.
    pub fn enqueue(&self, event: EventEnvelope) -> bool {
        let sender = self.sender.lock();
        let result = match sender.as_ref() {
            Some(tx) => match tx.try_send(event) {
                Ok(()) => Ok(()),
                Err(mpsc::error::TrySendError::Full(event))
                | Err(mpsc::error::TrySendError::Closed(event)) => Err(event),
            },
            None => Err(event),
        };
        drop(sender);

        match result {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(event) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(event_id = %event.id(), "Dispatch queue full, dropping event");
                false
            }
        }
    }

    /// Close the queue, let the workers drain it, and wait for all of them.
    ///
    /// Idempotent. A concurrent caller waits until the first one finishes.
    pub async fn stop(&self) {
        let mut handles = self.handles.lock().await;
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Stopping worker pool");
        self.sender.lock().take();

        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task failed");
            }
        }

        info!("Worker pool stopped");
    }

    /// Whether `stop` has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Get worker pool statistics
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("stopped", &self.is_stopped())
            .field("stats", &self.stats())
            .finish()
    }
}

async fn run_worker(
    name: String,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<EventEnvelope>>>,
    dispatcher: Arc<dyn EventDispatcher>,
    delay: Duration,
    processed: Arc<AtomicU64>,
) {
    debug!(worker = %name, "Worker started");

    loop {
        let next = receiver.lock().await.recv().await;
        let Some(event) = next else {
            break;
        };

        dispatcher.dispatch(&event);
        processed.fetch_add(1, Ordering::Relaxed);

        pause(delay).await;
    }

    debug!(worker = %name, "Worker stopped");
}

/// Rest between dispatches. Delays below the timer resolution yield
/// instead of sleeping.
async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    if delay < TIMER_RESOLUTION {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[derive(Default)]
    struct CountingDispatcher {
        seen: Mutex<Vec<String>>,
    }

    impl EventDispatcher for CountingDispatcher {
        fn dispatch(&self, event: &EventEnvelope) {
            self.seen.lock().push(event.id().to_string());
        }
    }

    struct NoOpDispatcher;

    impl EventDispatcher for NoOpDispatcher {
        fn dispatch(&self, _event: &EventEnvelope) {}
    }

    fn event(id: &str) -> EventEnvelope {
        EventEnvelope::new(id, "TestEvent", Utc::now(), ()).unwrap()
    }

    #[tokio::test]
    async fn test_worker_pool_dispatches() {
        let dispatcher = Arc::new(CountingDispatcher::default());
        let config = WorkerConfig::new().workers(2).queue_capacity(16);
        let pool = WorkerPool::start(&config, dispatcher.clone(), &Handle::current());

        for i in 0..10 {
            assert!(pool.enqueue(event(&format!("e{i}"))));
        }

        pool.stop().await;

        assert_eq!(dispatcher.seen.lock().len(), 10);
        let stats = pool.stats();
        assert_eq!(stats.enqueued, 10);
        assert_eq!(stats.processed, 10);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        // A current-thread runtime does not run the workers until we yield,
        // so the queue stays full while we enqueue.
        let config = WorkerConfig::new().workers(1).queue_capacity(2);
        let pool = WorkerPool::start(&config, Arc::new(NoOpDispatcher), &Handle::current());

        assert!(pool.enqueue(event("e1")));
        assert!(pool.enqueue(event("e2")));
        assert!(!pool.enqueue(event("e3")));

        pool.stop().await;
        let stats = pool.stats();
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.processed, 2);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_drops_later_events() {
        let config = WorkerConfig::new().workers(3);
        let pool = Arc::new(WorkerPool::start(&config, Arc::new(NoOpDispatcher), &Handle::current()));

        tokio::join!(pool.stop(), pool.stop());
        pool.stop().await;

        assert!(pool.is_stopped());
        assert!(!pool.enqueue(event("late")));
    }
}
