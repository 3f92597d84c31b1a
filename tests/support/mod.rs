#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use relaycrab::gateway::{
    ChannelMessenger, GatewaySession, PlatformError, PostedMessage, ShardId,
};
use relaycrab::relay::Snowflake;
use relaycrab::store::RedisStore;

// Redis-backed tests run only when this points at a disposable instance.
pub const REDIS_URL_ENV: &str = "RELAYCRAB_REDIS_URL";

pub async fn redis_store() -> Option<RedisStore> {
    let url = env::var(REDIS_URL_ENV).ok()?;
    let store = RedisStore::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("{REDIS_URL_ENV} is set but redis is unreachable: {e}"));
    Some(store)
}

pub fn unique_key(prefix: &str) -> String {
    format!("relaycrab:test:{prefix}:{}", rand::random::<u64>())
}

// -----------------------------------------------------------------------------
// ----- FakeShard -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel: u64, content: String },
    SendEmbed { channel: u64 },
    EditEmbed { channel: u64, message: u64 },
    Delete { channel: u64, message: u64 },
}

/// Records every call; fails all of them when `failing` is set.
#[derive(Debug)]
pub struct FakeShard {
    pub shard: ShardId,
    pub failing: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeShard {
    pub fn new(shard: ShardId) -> Arc<Self> {
        Arc::new(Self {
            shard,
            failing: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(shard: ShardId) -> Arc<Self> {
        Arc::new(Self {
            shard,
            failing: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        self.calls.lock().push(call);
        if self.failing {
            return Err(PlatformError::new("HTTP 403 Forbidden"));
        }
        Ok(())
    }
}

impl GatewaySession for FakeShard {
    fn shard_id(&self) -> ShardId {
        self.shard
    }
}

#[async_trait]
impl ChannelMessenger for FakeShard {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        content: &str,
    ) -> Result<PostedMessage, PlatformError> {
        self.record(Call::Send {
            channel: channel_id.get(),
            content: content.to_string(),
        })?;
        Ok(posted(channel_id))
    }

    async fn send_embed(
        &self,
        channel_id: Snowflake,
        _embed: &serde_json::Value,
    ) -> Result<PostedMessage, PlatformError> {
        self.record(Call::SendEmbed {
            channel: channel_id.get(),
        })?;
        Ok(posted(channel_id))
    }

    async fn edit_embed(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        _embed: &serde_json::Value,
    ) -> Result<PostedMessage, PlatformError> {
        self.record(Call::EditEmbed {
            channel: channel_id.get(),
            message: message_id.get(),
        })?;
        Ok(PostedMessage {
            id: message_id,
            channel_id,
        })
    }

    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), PlatformError> {
        self.record(Call::Delete {
            channel: channel_id.get(),
            message: message_id.get(),
        })
    }
}

pub const POSTED_ID: u64 = 900_000_000_000_000_001;

fn posted(channel_id: Snowflake) -> PostedMessage {
    PostedMessage {
        id: Snowflake::new(POSTED_ID).expect("non-zero"),
        channel_id,
    }
}
