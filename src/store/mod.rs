//! Backing stores for the gateway queue.
//!
//! The queue only needs three list primitives from a store: push at the
//! head, blocking pop from the tail, and length. Atomicity of each call is
//! the store's job; nothing in this crate locks around them.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

// -----------------------------------------------------------------------------
// ----- ListStore -------------------------------------------------------------

#[async_trait]
pub trait ListStore: Send + Sync {
    async fn push_front(&self, key: &str, value: Bytes) -> Result<(), StoreError>;

    /// Waits up to `timeout` for an element and removes the oldest one.
    /// `Ok(None)` means the wait elapsed. A zero timeout never blocks.
    async fn blocking_pop_back(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Option<Bytes>, StoreError>;

    async fn len(&self, key: &str) -> Result<u64, StoreError>;
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {source}")]
    Redis {
        #[from]
        source: ::redis::RedisError,
    },

    #[error("store did not answer within {0:?}")]
    Stalled(Duration),
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
