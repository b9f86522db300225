//! # Payload
//!
//! The value a serializer turns into bytes before signing.

use super::errors::VerifierError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A signable value.
///
/// `Structured` covers everything the structured serializers understand;
/// `Raw` carries bytes that were serialized before reaching the verifier
/// and go through the passthrough serializer untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Value),
    Raw(Vec<u8>),
}

impl Payload {
    /// Convert any serde value into a structured payload.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, VerifierError> {
        serde_json::to_value(value)
            .map(Payload::Structured)
            .map_err(|e| VerifierError::Payload(e.to_string()))
    }

    /// Convert the payload into a concrete type.
    ///
    /// Raw payloads are interpreted as JSON text.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, VerifierError> {
        match self {
            Payload::Structured(value) => serde_json::from_value(value),
            Payload::Raw(bytes) => serde_json::from_slice(&bytes),
        }
        .map_err(|e| VerifierError::Payload(e.to_string()))
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Payload::Structured(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Payload::Raw(bytes) => Some(bytes),
            Payload::Structured(_) => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Structured(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Structured(Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Structured(Value::String(value))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Raw(value)
    }
}
