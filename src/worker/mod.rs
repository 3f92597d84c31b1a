//! Consumer side of the gateway queue.
//!
//! `QueueWorker` drains envelopes one at a time and hands them to an
//! `EnvelopeHandler`. Store outages are retried here with capped
//! exponential backoff; the queue itself never retries.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::queue::{GatewayMessageQueue, MessageEnvelope, QueueError};

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

// -----------------------------------------------------------------------------
// ----- EnvelopeHandler -------------------------------------------------------

#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn handle(&self, envelope: MessageEnvelope);
}

/// Logs each envelope and drops it.
#[derive(Debug, Default)]
pub struct LogHandler;

#[async_trait]
impl EnvelopeHandler for LogHandler {
    async fn handle(&self, envelope: MessageEnvelope) {
        info!(
            "gateway event {:?} ({} bytes)",
            envelope.message_type,
            envelope.data.len()
        );
    }
}

// -----------------------------------------------------------------------------
// ----- WorkerStep ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStep {
    Handled,
    Idle,
    Poisoned,
    StoreDown,
}

// -----------------------------------------------------------------------------
// ----- QueueWorker -----------------------------------------------------------

pub struct QueueWorker<H> {
    queue: GatewayMessageQueue,
    handler: H,
    pop_timeout: Duration,
    backoff: Backoff,
}

impl<H: EnvelopeHandler> QueueWorker<H> {
    pub fn new(
        queue: GatewayMessageQueue,
        handler: H,
        pop_timeout: Duration,
        max_backoff: Duration,
    ) -> Self {
        Self {
            queue,
            handler,
            pop_timeout,
            backoff: Backoff::new(INITIAL_BACKOFF, max_backoff),
        }
    }

    pub fn queue(&self) -> &GatewayMessageQueue {
        &self.queue
    }
}

// -----------------------------------------------------------------------------
// ----- QueueWorker: Public Methods -------------------------------------------

impl<H: EnvelopeHandler> QueueWorker<H> {
    pub async fn poll_once(&self) -> WorkerStep {
        match self.queue.pop_with_timeout(self.pop_timeout).await {
            Ok(envelope) => {
                self.handler.handle(envelope).await;
                WorkerStep::Handled
            }
            Err(QueueError::Empty) => WorkerStep::Idle,
            Err(e @ QueueError::Decode { .. }) => {
                warn!("dropping envelope from {}: {e}", self.queue.key());
                WorkerStep::Poisoned
            }
            Err(e) => {
                error!("gateway queue {} unavailable: {e}", self.queue.key());
                WorkerStep::StoreDown
            }
        }
    }

    /// Drains until `shutdown` resolves. An in-flight pop is dropped at
    /// shutdown; with a remote store an envelope popped in that instant is
    /// lost, since delivery is at-most-once.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!("draining gateway queue {}", self.queue.key());

        loop {
            let step = select! {
                _ = &mut shutdown => break,
                step = self.poll_once() => step,
            };

            match step {
                WorkerStep::StoreDown => {
                    let delay = self.backoff.next_delay();
                    debug!("retrying gateway queue in {delay:?}");
                    select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                _ => self.backoff.reset(),
            }
        }

        info!("stopped draining gateway queue {}", self.queue.key());
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Backoff -----------------------------------------------------

#[derive(Debug, Clone)]
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::sync::Arc;

    use crate::queue::MessageType;
    use crate::store::{ListStore, MemoryStore, StoreError};

    #[derive(Default, Clone)]
    struct Collect(Arc<Mutex<Vec<MessageEnvelope>>>);

    #[async_trait]
    impl EnvelopeHandler for Collect {
        async fn handle(&self, envelope: MessageEnvelope) {
            self.0.lock().push(envelope);
        }
    }

    struct DownStore;

    #[async_trait]
    impl ListStore for DownStore {
        async fn push_front(&self, _key: &str, _value: Bytes) -> Result<(), StoreError> {
            Err(StoreError::Stalled(Duration::ZERO))
        }

        async fn blocking_pop_back(
            &self,
            _key: &str,
            _timeout: Duration,
        ) -> Result<Option<Bytes>, StoreError> {
            Err(StoreError::Stalled(Duration::ZERO))
        }

        async fn len(&self, _key: &str) -> Result<u64, StoreError> {
            Err(StoreError::Stalled(Duration::ZERO))
        }
    }

    fn worker(store: Arc<dyn ListStore>, handler: Collect) -> QueueWorker<Collect> {
        let queue = GatewayMessageQueue::with_key(store, "test:worker");
        QueueWorker::new(queue, handler, Duration::from_millis(10), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn poll_once_reports_each_outcome() {
        let store = Arc::new(MemoryStore::new());
        let seen = Collect::default();
        let w = worker(store.clone(), seen.clone());

        assert_eq!(w.poll_once().await, WorkerStep::Idle);

        w.queue()
            .push(MessageType::MessageCreate, &b"m"[..])
            .await
            .unwrap();
        assert_eq!(w.poll_once().await, WorkerStep::Handled);
        assert_eq!(seen.0.lock()[0].message_type, MessageType::MessageCreate);

        store
            .push_front("test:worker", Bytes::from_static(b"nope"))
            .await
            .unwrap();
        assert_eq!(w.poll_once().await, WorkerStep::Poisoned);

        let down = worker(Arc::new(DownStore), Collect::default());
        assert_eq!(down.poll_once().await, WorkerStep::StoreDown);
    }

    #[tokio::test]
    async fn run_drains_in_order_until_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let seen = Collect::default();
        let mut w = worker(store, seen.clone());

        for kind in [MessageType::GuildCreate, MessageType::GuildDelete] {
            w.queue().push(kind, Bytes::new()).await.unwrap();
        }

        w.run(tokio::time::sleep(Duration::from_millis(100))).await;

        let kinds: Vec<_> = seen.0.lock().iter().map(|e| e.message_type).collect();
        assert_eq!(kinds, vec![MessageType::GuildCreate, MessageType::GuildDelete]);
    }

    #[tokio::test]
    async fn run_stops_while_backing_off() {
        let mut w = worker(Arc::new(DownStore), Collect::default());
        let started = std::time::Instant::now();

        w.run(tokio::time::sleep(Duration::from_millis(50))).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(1));
        let delays: Vec<_> = (0..4).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
    }
}
