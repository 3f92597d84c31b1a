//! Durable hand-off of gateway events between processes.
//!
//! Producers push envelopes onto a list in the shared store; a consumer
//! pops them oldest-first with a bounded wait. The store is the single
//! source of truth: this module keeps no queue state of its own.

pub mod envelope;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analytics;
use crate::store::{ListStore, StoreError};

pub use envelope::{MessageEnvelope, MessageType, UnknownKind};

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

pub const GATEWAY_MESSAGE_KEY: &str = "automuteus:gateway:message";

// -----------------------------------------------------------------------------
// ----- GatewayMessageQueue ---------------------------------------------------

#[derive(Clone)]
pub struct GatewayMessageQueue {
    store: Arc<dyn ListStore>,
    key: Arc<str>,
}

impl GatewayMessageQueue {
    pub fn new(store: Arc<dyn ListStore>) -> Self {
        Self::with_key(store, GATEWAY_MESSAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn ListStore>, key: &str) -> Self {
        Self {
            store,
            key: Arc::from(key),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for GatewayMessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMessageQueue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ----- GatewayMessageQueue: Public Methods -----------------------------------

impl GatewayMessageQueue {
    /// Appends an envelope. Visible to consumers as soon as this returns.
    pub async fn push(
        &self,
        message_type: MessageType,
        data: impl Into<Bytes>,
    ) -> Result<(), QueueError> {
        let envelope = MessageEnvelope::new(message_type, data);
        let raw = envelope.encode().map_err(QueueError::Encode)?;

        self.store
            .push_front(&self.key, raw)
            .await
            .inspect_err(|e| {
                analytics::inc_store_error();
                warn!("push to {} failed: {e}", self.key);
            })?;

        analytics::inc_envelope_pushed();
        Ok(())
    }

    /// Removes and returns the oldest stored envelope without decoding it,
    /// waiting up to `timeout` for one to arrive.
    pub async fn pop_raw_with_timeout(&self, timeout: Duration) -> Result<Bytes, QueueError> {
        let popped = self
            .store
            .blocking_pop_back(&self.key, timeout)
            .await
            .inspect_err(|e| {
                analytics::inc_store_error();
                warn!("pop from {} failed: {e}", self.key);
            })?;

        match popped {
            Some(raw) => {
                analytics::inc_envelope_popped();
                Ok(raw)
            }
            None => {
                analytics::inc_empty_poll();
                debug!("nothing on {} after {timeout:?}", self.key);
                Err(QueueError::Empty)
            }
        }
    }

    pub async fn pop_with_timeout(&self, timeout: Duration) -> Result<MessageEnvelope, QueueError> {
        let raw = self.pop_raw_with_timeout(timeout).await?;

        MessageEnvelope::decode(&raw).map_err(|source| {
            analytics::inc_decode_error();
            QueueError::Decode { source, raw }
        })
    }

    /// Current backlog. Only meaningful for monitoring; it can be stale by
    /// the time the caller reads it.
    pub async fn size(&self) -> Result<u64, QueueError> {
        let len = self.store.len(&self.key).await.inspect_err(|e| {
            analytics::inc_store_error();
            warn!("size of {} unavailable: {e}", self.key);
        })?;

        Ok(len)
    }
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("no envelope arrived before the timeout")]
    Empty,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("malformed envelope ({} bytes): {source}", .raw.len())]
    Decode {
        source: serde_json::Error,
        raw: Bytes,
    },

    #[error("failed to encode envelope: {0}")]
    Encode(serde_json::Error),
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn queue() -> (Arc<MemoryStore>, GatewayMessageQueue) {
        let store = Arc::new(MemoryStore::new());
        let queue = GatewayMessageQueue::with_key(store.clone(), "test:queue");
        (store, queue)
    }

    #[tokio::test]
    async fn push_then_pop_round_trips() {
        let (_, q) = queue();
        q.push(MessageType::VoiceStateUpdate, &b"{\"x\":1}"[..])
            .await
            .unwrap();

        let env = q.pop_with_timeout(Duration::from_millis(100)).await.unwrap();
        assert_eq!(env.message_type, MessageType::VoiceStateUpdate);
        assert_eq!(&env.data[..], b"{\"x\":1}");

        let err = q.pop_with_timeout(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, QueueError::Empty));
    }

    #[tokio::test]
    async fn raw_pop_returns_stored_bytes() {
        let (_, q) = queue();
        q.push(MessageType::GuildDelete, &b"g"[..]).await.unwrap();

        let raw = q.pop_raw_with_timeout(Duration::ZERO).await.unwrap();
        assert_eq!(&raw[..], br#"{"MessageType":1,"Data":"Zw=="}"#);
    }

    #[tokio::test]
    async fn garbage_in_the_list_is_a_decode_error() {
        let (store, q) = queue();
        store
            .push_front("test:queue", Bytes::from_static(b"{oops"))
            .await
            .unwrap();

        match q.pop_with_timeout(Duration::ZERO).await.unwrap_err() {
            QueueError::Decode { raw, .. } => assert_eq!(&raw[..], b"{oops"),
            other => panic!("expected Decode, got {other:?}"),
        }
        assert_eq!(q.size().await.unwrap(), 0);
    }

    struct DownStore;

    #[async_trait::async_trait]
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

    #[tokio::test]
    async fn every_failed_store_call_is_counted() {
        let q = GatewayMessageQueue::with_key(Arc::new(DownStore), "test:down");
        let before = analytics::snapshot().store_errors;

        let pushed = q.push(MessageType::GuildCreate, Bytes::new()).await;
        assert!(matches!(pushed, Err(QueueError::StoreUnavailable(_))));

        let sized = q.size().await;
        assert!(matches!(sized, Err(QueueError::StoreUnavailable(_))));

        let popped = q.pop_with_timeout(Duration::ZERO).await;
        assert!(matches!(popped, Err(QueueError::StoreUnavailable(_))));

        // Counters are process-wide and other tests run alongside.
        assert!(analytics::snapshot().store_errors >= before + 3);
    }

    #[tokio::test]
    async fn unbounded_timeout_pops_a_queued_envelope() {
        let (_, q) = queue();
        q.push(MessageType::MessageCreate, &b"now"[..]).await.unwrap();

        let env = q.pop_with_timeout(Duration::MAX).await.unwrap();
        assert_eq!(env.message_type, MessageType::MessageCreate);
        assert_eq!(&env.data[..], b"now");
    }

    #[tokio::test]
    async fn every_constructible_kind_survives_the_queue() {
        let (_, q) = queue();
        let kinds: Vec<_> = (-2..8)
            .chain([i64::MIN, i64::MAX])
            .map(MessageType::from)
            .collect();

        for kind in &kinds {
            q.push(*kind, &b"k"[..]).await.unwrap();
        }
        for kind in &kinds {
            let env = q.pop_with_timeout(Duration::ZERO).await.unwrap();
            assert_eq!(env.message_type, *kind);
            assert_eq!(env.message_type.as_i64(), kind.as_i64());
        }
    }

    #[tokio::test]
    async fn uses_the_well_known_key_by_default() {
        let store = Arc::new(MemoryStore::new());
        let q = GatewayMessageQueue::new(store.clone());
        q.push(MessageType::GuildCreate, Bytes::new()).await.unwrap();

        assert_eq!(q.key(), GATEWAY_MESSAGE_KEY);
        assert_eq!(store.len(GATEWAY_MESSAGE_KEY).await.unwrap(), 1);
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
