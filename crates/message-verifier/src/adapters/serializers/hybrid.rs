//! # Hybrid Serializer
//!
//! Writes JSON, reads JSON or legacy objects. Used while migrating a
//! deployment off the legacy format: tokens issued before the switch keep
//! verifying, new tokens are JSON only.
//!
//! Decoding walks an ordered list of decoders. `NotThisFormat` moves on to
//! the next decoder; `Decoded` and `Failed` end the walk.

use super::json::JsonSerializer;
use super::legacy::LegacyObjectSerializer;
use crate::domain::errors::SerializerError;
use crate::domain::payload::Payload;
use crate::ports::outbound::{DecodeAttempt, PayloadSerializer};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HybridSerializer {
    writer: JsonSerializer,
    decoders: Vec<Arc<dyn PayloadSerializer>>,
}

impl HybridSerializer {
    pub const NAME: &'static str = "hybrid";

    /// JSON first, then the given legacy reader.
    pub fn new(legacy: LegacyObjectSerializer) -> Self {
        Self {
            writer: JsonSerializer,
            decoders: vec![Arc::new(JsonSerializer), Arc::new(legacy)],
        }
    }

    /// Names of the decoders in trial order.
    pub fn decoder_names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }
}

impl Default for HybridSerializer {
    fn default() -> Self {
        Self::new(LegacyObjectSerializer::new())
    }
}

impl PayloadSerializer for HybridSerializer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError> {
        self.writer.encode(payload)
    }

    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt {
        for decoder in &self.decoders {
            match decoder.try_decode(bytes) {
                DecodeAttempt::NotThisFormat => continue,
                outcome => return outcome,
            }
        }
        DecodeAttempt::NotThisFormat
    }
}
