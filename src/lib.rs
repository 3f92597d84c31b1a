pub mod admin;
pub mod analytics;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod queue;
pub mod relay;
pub mod store;
pub mod worker;

pub use config::Config;
pub use errors::{ErrorClass, RelayError};
pub use gateway::{ChannelMessenger, GatewaySession, ShardSessionPool};
pub use queue::{GatewayMessageQueue, MessageEnvelope, MessageType, QueueError};
pub use relay::MessageRelay;
pub use worker::{EnvelopeHandler, LogHandler, QueueWorker};
