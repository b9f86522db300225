//! # Error Types
//!
//! Error enums for configuration, serialization and verification.
//!
//! ## Anti-Oracle Rule
//!
//! Malformed tokens, MAC mismatches, purpose mismatches and expired tokens
//! all surface as [`VerifierError::InvalidSignature`]. A caller can never
//! tell "wrong key" from "right key, wrong purpose" from "expired".
//! Deserialization failures are the one exception: they only happen after a
//! MAC matched, so they point at a deployment bug rather than tampering.

use thiserror::Error;

/// Errors raised while building a verifier or its configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The secret was empty.
    #[error("Secret must not be empty")]
    EmptySecret,

    /// Digest identifier is not one of SHA1, SHA256, SHA384, SHA512.
    #[error("Unknown digest algorithm: {0}")]
    UnknownDigest(String),

    /// Serializer identifier is not one of json, legacy, hybrid, passthrough.
    #[error("Unknown serializer: {0}")]
    UnknownSerializer(String),

    /// Secret could not be decoded from its textual form.
    #[error("Invalid secret encoding: {0}")]
    InvalidSecretEncoding(String),

    /// A required setting was not provided.
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// A setting was provided but could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidSetting { name: String, value: String },
}

/// Errors from payload serializers and the metadata envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializerError {
    /// Structured-text (JSON) encoding or decoding failed.
    #[error("JSON serialization error: {0}")]
    Json(String),

    /// Legacy object-graph encoding or decoding failed.
    #[error("Legacy object serialization error: {0}")]
    Legacy(String),

    /// A legacy object referenced a class this process cannot resolve.
    #[error("Unknown referenced type: {0}")]
    UnknownType(String),

    /// The bytes belong to a different serializer's format.
    #[error("Refusing {found} data in {expected} serializer")]
    ForeignFormat {
        expected: &'static str,
        found: &'static str,
    },

    /// No decoder recognised the bytes.
    #[error("Data is not in {0} format")]
    UnrecognizedFormat(&'static str),

    /// The serializer cannot represent this kind of payload.
    #[error("{serializer} serializer cannot encode payload: {reason}")]
    UnsupportedPayload {
        serializer: &'static str,
        reason: String,
    },

    /// The metadata envelope was recognised but its fields are corrupt.
    #[error("Corrupt metadata envelope: {0}")]
    Envelope(String),
}

/// Errors surfaced by the verifier's public API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    /// Token is malformed, forged, tampered, expired or bound to another purpose.
    #[error("Invalid signature")]
    InvalidSignature,

    /// MAC matched but the payload could not be decoded by the matched serializer.
    #[error("Payload deserialization failed: {0}")]
    Deserialization(SerializerError),

    /// The primary serializer could not encode the payload.
    #[error("Payload serialization failed: {0}")]
    Serialization(SerializerError),

    /// A typed payload could not be converted to or from the requested type.
    #[error("Payload conversion failed: {0}")]
    Payload(String),

    /// The requested expiry overflows or cannot be written to the envelope.
    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),
}

impl VerifierError {
    /// Returns true for the merged signature-invalid kind.
    #[must_use]
    pub fn is_invalid_signature(&self) -> bool {
        matches!(self, VerifierError::InvalidSignature)
    }
}

/// Structural token failure. Never crosses the public boundary.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub(crate) enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(&'static str),
}
