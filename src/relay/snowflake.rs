use std::fmt;

use serde::{Serialize, Serializer};

use crate::errors::RelayError;

// -----------------------------------------------------------------------------
// ----- Snowflake -------------------------------------------------------------

/// Platform object id (channel, message). Always a non-zero `u64`, written
/// on the wire as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(u64);

impl Snowflake {
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Parses a caller-supplied id. `field` names the input in the error.
    pub fn parse(field: &'static str, input: &str) -> Result<Self, RelayError> {
        let invalid = |reason: &str| RelayError::InvalidInput {
            field,
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("missing"));
        }
        if !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be a decimal id"));
        }

        let raw: u64 = input.parse().map_err(|_| invalid("out of range"))?;
        Self::new(raw).ok_or_else(|| invalid("must be non-zero"))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(input: &str) -> String {
        match Snowflake::parse("channel_id", input).unwrap_err() {
            RelayError::InvalidInput { field, reason } => {
                assert_eq!(field, "channel_id");
                reason
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn accepts_decimal_ids() {
        let id = Snowflake::parse("channel_id", "754465589958803548").unwrap();
        assert_eq!(id.get(), 754465589958803548);
        assert_eq!(id.to_string(), "754465589958803548");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"754465589958803548\"");
    }

    #[test]
    fn rejects_bad_ids() {
        assert_eq!(reason(""), "missing");
        assert_eq!(reason("12a4"), "must be a decimal id");
        assert_eq!(reason("-5"), "must be a decimal id");
        assert_eq!(reason(" 42"), "must be a decimal id");
        assert_eq!(reason("99999999999999999999999"), "out of range");
        assert_eq!(reason("0"), "must be non-zero");
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
