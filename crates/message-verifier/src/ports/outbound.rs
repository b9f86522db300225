//! # Outbound Ports (Driven Ports / SPI)
//!
//! Capabilities the engine needs from its surroundings: a payload
//! serializer and a clock.

use crate::domain::errors::SerializerError;
use crate::domain::payload::Payload;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Result of one decode attempt inside a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeAttempt {
    /// The bytes were in this serializer's format and decoded cleanly.
    Decoded(Payload),
    /// The bytes are not in this serializer's format; the next attempt may try.
    NotThisFormat,
    /// The bytes are in this serializer's format but are corrupt or refer to
    /// something this process cannot resolve. Stops the chain.
    Failed(SerializerError),
}

/// Pluggable payload encoding.
///
/// The engine depends only on this trait. Implementations must be
/// stateless or internally immutable; one instance serves concurrent calls.
pub trait PayloadSerializer: Send + Sync + Debug {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Encode a payload into bytes.
    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError>;

    /// Try to decode bytes, reporting whether they were in this format at all.
    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt;

    /// Decode bytes, treating "not this format" as an error.
    fn decode(&self, bytes: &[u8]) -> Result<Payload, SerializerError> {
        match self.try_decode(bytes) {
            DecodeAttempt::Decoded(payload) => Ok(payload),
            DecodeAttempt::Failed(err) => Err(err),
            DecodeAttempt::NotThisFormat => Err(SerializerError::UnrecognizedFormat(self.name())),
        }
    }
}

/// Source of the current time, read once per generate/verify call.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}
