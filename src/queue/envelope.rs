use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// -----------------------------------------------------------------------------
// ----- MessageType -----------------------------------------------------------

/// Kind of gateway event carried by an envelope.
///
/// Wire values are stable. Values this build does not know decode into
/// `Unknown` and encode back to the same integer. An `Unknown` can only be
/// obtained through `From<i64>`, so it never holds a known value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MessageType {
    GuildCreate,
    GuildDelete,
    VoiceStateUpdate,
    MessageCreate,
    MessageReactionAdd,
    Unknown(UnknownKind),
}

/// Wire value of a message kind this build does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownKind(i64);

impl UnknownKind {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl MessageType {
    pub fn as_i64(self) -> i64 {
        match self {
            MessageType::GuildCreate => 0,
            MessageType::GuildDelete => 1,
            MessageType::VoiceStateUpdate => 2,
            MessageType::MessageCreate => 3,
            MessageType::MessageReactionAdd => 4,
            MessageType::Unknown(kind) => kind.get(),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, MessageType::Unknown(_))
    }
}

impl From<i64> for MessageType {
    fn from(raw: i64) -> Self {
        match raw {
            0 => MessageType::GuildCreate,
            1 => MessageType::GuildDelete,
            2 => MessageType::VoiceStateUpdate,
            3 => MessageType::MessageCreate,
            4 => MessageType::MessageReactionAdd,
            other => MessageType::Unknown(UnknownKind(other)),
        }
    }
}

impl From<MessageType> for i64 {
    fn from(kind: MessageType) -> Self {
        kind.as_i64()
    }
}

// -----------------------------------------------------------------------------
// ----- MessageEnvelope -------------------------------------------------------

/// One queued gateway event. Stored as
/// `{"MessageType": <int>, "Data": <base64 or null>}`, which is what the
/// existing producers write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "MessageType")]
    pub message_type: MessageType,

    #[serde(rename = "Data", default, with = "base64_payload")]
    pub data: Bytes,
}

impl MessageEnvelope {
    pub fn new(message_type: MessageType, data: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            data: data.into(),
        }
    }

    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn decode(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Payload encoding --------------------------------------------

mod base64_payload {
    use super::*;

    pub fn serialize<S: Serializer>(data: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let Some(encoded) = Option::<String>::deserialize(d)? else {
            return Ok(Bytes::new());
        };

        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
