//! Structured-text serializer backed by `serde_json`.

use super::legacy::has_legacy_marker;
use crate::domain::errors::SerializerError;
use crate::domain::payload::Payload;
use crate::ports::outbound::{DecodeAttempt, PayloadSerializer};
use serde_json::Value;

/// Encodes structured payloads as compact JSON.
///
/// Refuses legacy-object bytes outright instead of reporting a parse error,
/// so a deployment that switched serializers too early gets a clear message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub const NAME: &'static str = "json";
}

impl PayloadSerializer for JsonSerializer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError> {
        match payload {
            Payload::Structured(value) => {
                serde_json::to_vec(value).map_err(|e| SerializerError::Json(e.to_string()))
            }
            Payload::Raw(_) => Err(SerializerError::UnsupportedPayload {
                serializer: Self::NAME,
                reason: "raw bytes require the passthrough serializer".to_string(),
            }),
        }
    }

    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt {
        if has_legacy_marker(bytes) {
            return DecodeAttempt::NotThisFormat;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => DecodeAttempt::Decoded(Payload::Structured(value)),
            Err(e) => DecodeAttempt::Failed(SerializerError::Json(e.to_string())),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Payload, SerializerError> {
        match self.try_decode(bytes) {
            DecodeAttempt::Decoded(payload) => Ok(payload),
            DecodeAttempt::Failed(err) => Err(err),
            DecodeAttempt::NotThisFormat => Err(SerializerError::ForeignFormat {
                expected: Self::NAME,
                found: super::legacy::LegacyObjectSerializer::NAME,
            }),
        }
    }
}
