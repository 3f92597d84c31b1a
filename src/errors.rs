use thiserror::Error;

use crate::gateway::{PlatformError, PoolError};
use crate::queue::QueueError;

// -----------------------------------------------------------------------------
// ----- ErrorClass ------------------------------------------------------------

/// Coarse category a boundary caller maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something unusable.
    Validation,
    /// A shard, the store, or the platform is down. Retry later.
    Unavailable,
    /// Nothing there, e.g. no envelope before the timeout.
    NotFound,
    /// Producer and consumer disagree about the envelope format.
    Internal,
}

// -----------------------------------------------------------------------------
// ----- RelayError ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("platform call {op} failed: {source}")]
    Upstream {
        op: &'static str,
        source: PlatformError,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl RelayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RelayError::InvalidInput { .. } => ErrorClass::Validation,
            RelayError::Pool(PoolError::NoShardsAvailable) => ErrorClass::Unavailable,
            RelayError::Upstream { .. } => ErrorClass::Unavailable,
            RelayError::Queue(err) => queue_class(err),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Unavailable
    }
}

fn queue_class(err: &QueueError) -> ErrorClass {
    match err {
        QueueError::Empty => ErrorClass::NotFound,
        QueueError::StoreUnavailable(_) => ErrorClass::Unavailable,
        QueueError::Decode { .. } | QueueError::Encode(_) => ErrorClass::Internal,
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::time::Duration;

    #[test]
    fn classes_cover_every_boundary_condition() {
        let invalid = RelayError::InvalidInput {
            field: "channel_id",
            reason: "missing".into(),
        };
        assert_eq!(invalid.class(), ErrorClass::Validation);
        assert!(!invalid.is_retryable());

        let no_shards = RelayError::from(PoolError::NoShardsAvailable);
        assert_eq!(no_shards.class(), ErrorClass::Unavailable);
        assert!(no_shards.is_retryable());

        let upstream = RelayError::Upstream {
            op: "send_message",
            source: PlatformError::new("429 too many requests"),
        };
        assert_eq!(upstream.class(), ErrorClass::Unavailable);

        let empty = RelayError::from(QueueError::Empty);
        assert_eq!(empty.class(), ErrorClass::NotFound);

        let stalled = RelayError::from(QueueError::from(StoreError::Stalled(
            Duration::from_secs(1),
        )));
        assert_eq!(stalled.class(), ErrorClass::Unavailable);

        let decode = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let poisoned = RelayError::from(QueueError::Decode {
            source: decode,
            raw: bytes::Bytes::from_static(b"{"),
        });
        assert_eq!(poisoned.class(), ErrorClass::Internal);
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
