pub mod snowflake;

use std::sync::Arc;

use tracing::{error, info};

use crate::errors::RelayError;
use crate::gateway::{ChannelMessenger, PostedMessage, ShardSessionPool};

pub use snowflake::Snowflake;

// -----------------------------------------------------------------------------
// ----- MessageRelay ----------------------------------------------------------

/// Outbound channel-message calls, each made on a randomly picked shard.
///
/// Nothing here retries. A missing shard or a failed platform call comes
/// back as an error whose class tells the caller whether to retry.
#[derive(Debug)]
pub struct MessageRelay<S> {
    pool: Arc<ShardSessionPool<S>>,
}

impl<S> Clone for MessageRelay<S> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<S: ChannelMessenger> MessageRelay<S> {
    pub fn new(pool: Arc<ShardSessionPool<S>>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ShardSessionPool<S> {
        &self.pool
    }
}

// -----------------------------------------------------------------------------
// ----- MessageRelay: Public Methods ------------------------------------------

impl<S: ChannelMessenger> MessageRelay<S> {
    pub async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<PostedMessage, RelayError> {
        let channel_id = Snowflake::parse("channel_id", channel_id)?;
        let session = self.session("send_message")?;

        let posted = session
            .send_message(channel_id, content)
            .await
            .map_err(|source| {
                error!(
                    "error posting message to channel {channel_id} via shard {}: {source}",
                    session.shard_id()
                );
                RelayError::Upstream {
                    op: "send_message",
                    source,
                }
            })?;

        info!(
            "posted message {} to channel {channel_id} ({} bytes)",
            posted.id,
            content.len()
        );
        Ok(posted)
    }

    pub async fn send_embed(
        &self,
        channel_id: &str,
        embed: &[u8],
    ) -> Result<PostedMessage, RelayError> {
        let channel_id = Snowflake::parse("channel_id", channel_id)?;
        let embed = parse_embed(embed)?;
        let session = self.session("send_embed")?;

        let posted = session
            .send_embed(channel_id, &embed)
            .await
            .map_err(|source| {
                error!(
                    "error posting embed to channel {channel_id} via shard {}: {source}",
                    session.shard_id()
                );
                RelayError::Upstream {
                    op: "send_embed",
                    source,
                }
            })?;

        info!("posted embed {} to channel {channel_id}", posted.id);
        Ok(posted)
    }

    pub async fn edit_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &[u8],
    ) -> Result<PostedMessage, RelayError> {
        let channel_id = Snowflake::parse("channel_id", channel_id)?;
        let message_id = Snowflake::parse("message_id", message_id)?;
        let embed = parse_embed(embed)?;
        let session = self.session("edit_embed")?;

        let posted = session
            .edit_embed(channel_id, message_id, &embed)
            .await
            .map_err(|source| {
                error!(
                    "error editing message {message_id} in channel {channel_id} via shard {}: {source}",
                    session.shard_id()
                );
                RelayError::Upstream {
                    op: "edit_embed",
                    source,
                }
            })?;

        info!("edited message {message_id} in channel {channel_id}");
        Ok(posted)
    }

    /// Returns the id of the deleted message.
    pub async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Snowflake, RelayError> {
        let channel_id = Snowflake::parse("channel_id", channel_id)?;
        let message_id = Snowflake::parse("message_id", message_id)?;
        let session = self.session("delete_message")?;

        session
            .delete_message(channel_id, message_id)
            .await
            .map_err(|source| {
                error!(
                    "error deleting message {message_id} in channel {channel_id} via shard {}: {source}",
                    session.shard_id()
                );
                RelayError::Upstream {
                    op: "delete_message",
                    source,
                }
            })?;

        info!("deleted message {message_id} in channel {channel_id}");
        Ok(message_id)
    }
}

// -----------------------------------------------------------------------------
// ----- MessageRelay: Private Methods -----------------------------------------

impl<S: ChannelMessenger> MessageRelay<S> {
    fn session(&self, op: &'static str) -> Result<Arc<S>, RelayError> {
        self.pool.pick_random().map_err(|e| {
            error!("error obtaining random session for {op}: {e}");
            RelayError::from(e)
        })
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

fn parse_embed(raw: &[u8]) -> Result<serde_json::Value, RelayError> {
    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| RelayError::InvalidInput {
            field: "embed",
            reason: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(RelayError::InvalidInput {
            field: "embed",
            reason: "must be a JSON object".to_string(),
        });
    }

    Ok(value)
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
