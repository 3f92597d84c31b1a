use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::relay::Snowflake;

// -----------------------------------------------------------------------------
// ----- ShardId ---------------------------------------------------------------

pub type ShardId = u32;

// -----------------------------------------------------------------------------
// ----- GatewaySession --------------------------------------------------------

/// A live gateway connection owned by the connection-lifecycle code.
///
/// The pool hands out shared handles to these. A handle is known to be
/// connected when it is selected; a disconnect may race with its use, so
/// callers must tolerate platform errors from a stale session.
pub trait GatewaySession: Send + Sync + 'static {
    fn shard_id(&self) -> ShardId;
}

// -----------------------------------------------------------------------------
// ----- ChannelMessenger ------------------------------------------------------

/// Channel-message REST calls the platform client performs over a session.
#[async_trait]
pub trait ChannelMessenger: GatewaySession {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        content: &str,
    ) -> Result<PostedMessage, PlatformError>;

    async fn send_embed(
        &self,
        channel_id: Snowflake,
        embed: &serde_json::Value,
    ) -> Result<PostedMessage, PlatformError>;

    async fn edit_embed(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        embed: &serde_json::Value,
    ) -> Result<PostedMessage, PlatformError>;

    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), PlatformError>;
}

// -----------------------------------------------------------------------------
// ----- PostedMessage ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
}

// -----------------------------------------------------------------------------
// ----- PlatformError ---------------------------------------------------------

/// Failure reported by the platform client. Opaque to the relay.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PlatformError {
    message: String,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
