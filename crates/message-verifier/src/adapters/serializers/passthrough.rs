//! Null serializer for payloads that arrive already serialized.

use crate::domain::errors::SerializerError;
use crate::domain::payload::Payload;
use crate::ports::outbound::{DecodeAttempt, PayloadSerializer};
use serde_json::Value;

/// Bytes in, the same bytes out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSerializer;

impl PassthroughSerializer {
    pub const NAME: &'static str = "passthrough";
}

impl PayloadSerializer for PassthroughSerializer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError> {
        match payload {
            Payload::Raw(bytes) => Ok(bytes.clone()),
            Payload::Structured(Value::String(text)) => Ok(text.as_bytes().to_vec()),
            Payload::Structured(_) => Err(SerializerError::UnsupportedPayload {
                serializer: Self::NAME,
                reason: "only raw bytes or strings can pass through".to_string(),
            }),
        }
    }

    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt {
        DecodeAttempt::Decoded(Payload::Raw(bytes.to_vec()))
    }
}
