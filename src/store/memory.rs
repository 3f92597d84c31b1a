use std::collections::{HashMap, VecDeque};
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};

use super::{ListStore, StoreError};

// -----------------------------------------------------------------------------
// ----- MemoryStore -----------------------------------------------------------

/// In-process list store. Lists live only as long as the process, so this
/// is for tests and single-process setups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Mutex<HashMap<String, VecDeque<Bytes>>>,
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop_back(&self, key: &str) -> Option<Bytes> {
        let mut lists = self.lists.lock();
        let list = lists.get_mut(key)?;
        let value = list.pop_back();
        if list.is_empty() {
            lists.remove(key);
        }
        value
    }
}

// -----------------------------------------------------------------------------
// ----- MemoryStore: ListStore ------------------------------------------------

#[async_trait]
impl ListStore for MemoryStore {
    async fn push_front(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.lists
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_front(value);

        self.pushed.notify_waiters();
        Ok(())
    }

    async fn blocking_pop_back(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Option<Bytes>, StoreError> {
        // A timeout past what the clock can represent waits until a push.
        let deadline = Instant::now().checked_add(timeout);

        loop {
            // Register interest before checking, so a push between the
            // check and the await still wakes us.
            let mut notified = pin!(self.pushed.notified());
            notified.as_mut().enable();

            if let Some(value) = self.try_pop_back(key) {
                return Ok(Some(value));
            }

            match deadline {
                Some(deadline) => {
                    if timeout_at(deadline, notified).await.is_err() {
                        return Ok(self.try_pop_back(key));
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn len(&self, key: &str) -> Result<u64, StoreError> {
        let lists = self.lists.lock();
        Ok(lists.get(key).map_or(0, |list| list.len() as u64))
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
