use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::{debug, info};

use super::session::{GatewaySession, ShardId};
use crate::analytics;

// -----------------------------------------------------------------------------
// ----- ShardSessionPool ------------------------------------------------------

/// Every currently connected gateway session, keyed by shard id.
///
/// Connect/disconnect events call `register`/`deregister`; request handlers
/// call `pick_random`. The read lock is only held long enough to clone one
/// handle, never across the platform call that follows.
#[derive(Debug)]
pub struct ShardSessionPool<S> {
    inner: RwLock<ShardSet<S>>,
}

impl<S> Default for ShardSessionPool<S> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(ShardSet {
                sessions: Vec::new(),
                slots: HashMap::new(),
            }),
        }
    }
}

impl<S: GatewaySession> ShardSessionPool<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

// -----------------------------------------------------------------------------
// ----- ShardSessionPool: Lifecycle -------------------------------------------

impl<S: GatewaySession> ShardSessionPool<S> {
    /// Adds a freshly connected session. A session already registered for
    /// the same shard is replaced and returned.
    pub fn register(&self, session: Arc<S>) -> Option<Arc<S>> {
        let shard = session.shard_id();
        let replaced = self.inner.write().insert(session);

        match replaced {
            Some(_) => info!("shard {shard} reconnected; session replaced"),
            None => info!("shard {shard} registered"),
        }

        replaced
    }

    pub fn deregister(&self, shard: ShardId) -> Option<Arc<S>> {
        let removed = self.inner.write().remove(shard);

        if removed.is_some() {
            info!("shard {shard} deregistered");
        } else {
            debug!("deregister for unknown shard {shard} ignored");
        }

        removed
    }
}

// -----------------------------------------------------------------------------
// ----- ShardSessionPool: Selection -------------------------------------------

impl<S: GatewaySession> ShardSessionPool<S> {
    pub fn pick_random(&self) -> Result<Arc<S>, PoolError> {
        let picked = {
            let set = self.inner.read();
            let mut rng = rand::rng();
            set.sessions.choose(&mut rng).cloned()
        };

        match picked {
            Some(session) => {
                analytics::inc_session_pick();
                Ok(session)
            }
            None => {
                analytics::inc_no_shards();
                Err(PoolError::NoShardsAvailable)
            }
        }
    }

    pub fn get(&self, shard: ShardId) -> Option<Arc<S>> {
        let set = self.inner.read();
        set.slots.get(&shard).map(|&slot| set.sessions[slot].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_ids(&self) -> Vec<ShardId> {
        let mut ids: Vec<ShardId> = self.inner.read().slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: ShardSet ----------------------------------------------------

// Dense vector for O(1) random picks, slot index for O(1) removal.
#[derive(Debug)]
struct ShardSet<S> {
    sessions: Vec<Arc<S>>,
    slots: HashMap<ShardId, usize>,
}

impl<S: GatewaySession> ShardSet<S> {
    fn insert(&mut self, session: Arc<S>) -> Option<Arc<S>> {
        let shard = session.shard_id();

        if let Some(&slot) = self.slots.get(&shard) {
            return Some(std::mem::replace(&mut self.sessions[slot], session));
        }

        self.slots.insert(shard, self.sessions.len());
        self.sessions.push(session);
        None
    }

    fn remove(&mut self, shard: ShardId) -> Option<Arc<S>> {
        let slot = self.slots.remove(&shard)?;
        let removed = self.sessions.swap_remove(slot);

        // The former last element now lives in `slot`.
        if let Some(moved) = self.sessions.get(slot) {
            self.slots.insert(moved.shard_id(), slot);
        }

        Some(removed)
    }
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("no gateway shards are currently connected")]
    NoShardsAvailable,
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
