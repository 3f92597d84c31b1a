pub mod pool;
pub mod session;

pub use pool::{PoolError, ShardSessionPool};
pub use session::{ChannelMessenger, GatewaySession, PlatformError, PostedMessage, ShardId};

// Shard bookkeeping only; the platform client lives behind ChannelMessenger.
