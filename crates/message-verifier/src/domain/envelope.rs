//! # Envelope Codec
//!
//! Serializes a payload together with optional [`Metadata`].
//!
//! ## Wire Format
//!
//! - Without metadata the envelope is exactly `serializer.encode(payload)`,
//!   so tokens stay byte-compatible with plain signed payloads and with
//!   tokens issued before metadata existed.
//! - With metadata the envelope is a JSON document, independent of the
//!   payload serializer:
//!
//! ```text
//! {"_envelope":{"message":"<base64 serialized payload>","exp":"<rfc3339>","pur":"<purpose>"}}
//! ```
//!
//! Decoding tries the metadata form first and falls back to a bare payload
//! when the bytes do not have that exact shape.

use super::errors::SerializerError;
use super::metadata::Metadata;
use super::payload::Payload;
use crate::ports::outbound::PayloadSerializer;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level key marking a metadata envelope.
pub const ENVELOPE_KEY: &str = "_envelope";

const OPTIONAL_FIELDS: [&str; 2] = ["exp", "pur"];

#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeDocument {
    #[serde(rename = "_envelope")]
    envelope: EnvelopeBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnvelopeBody {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pur: Option<String>,
}

/// Serialize a payload, wrapping it when metadata is present.
pub fn wrap(
    payload: &Payload,
    metadata: Option<&Metadata>,
    serializer: &dyn PayloadSerializer,
) -> Result<Vec<u8>, SerializerError> {
    let serialized = serializer.encode(payload)?;

    let Some(meta) = metadata else {
        return Ok(serialized);
    };

    let document = EnvelopeDocument {
        envelope: EnvelopeBody {
            message: STANDARD.encode(&serialized),
            exp: meta.expires_at_wire(),
            pur: meta.purpose.clone(),
        },
    };
    serde_json::to_vec(&document).map_err(|e| SerializerError::Envelope(e.to_string()))
}

/// Inverse of [`wrap`].
pub fn unwrap(
    bytes: &[u8],
    serializer: &dyn PayloadSerializer,
) -> Result<(Payload, Option<Metadata>), SerializerError> {
    match extract_envelope(bytes)? {
        Some((serialized, metadata)) => Ok((serializer.decode(&serialized)?, Some(metadata))),
        None => Ok((serializer.decode(bytes)?, None)),
    }
}

/// Recognise the metadata form.
///
/// `Ok(None)` means "not an envelope, treat as bare payload". An envelope
/// that is recognised but has corrupt fields is an error.
fn extract_envelope(bytes: &[u8]) -> Result<Option<(Vec<u8>, Metadata)>, SerializerError> {
    // Cheap rejection before attempting a JSON parse.
    if bytes.first() != Some(&b'{') {
        return Ok(None);
    }
    let Ok(Value::Object(root)) = serde_json::from_slice::<Value>(bytes) else {
        return Ok(None);
    };
    if root.len() != 1 {
        return Ok(None);
    }
    let Some(Value::Object(fields)) = root.get(ENVELOPE_KEY) else {
        return Ok(None);
    };
    if !fields.get("message").is_some_and(Value::is_string) {
        return Ok(None);
    }
    // Anything beyond message plus string-valued exp/pur is a user document.
    let exact_shape = fields.iter().all(|(key, value)| {
        key == "message" || (OPTIONAL_FIELDS.contains(&key.as_str()) && value.is_string())
    });
    if !exact_shape {
        return Ok(None);
    }
    let body = Value::Object(fields.clone());

    let body: EnvelopeBody = serde_json::from_value(body)
        .map_err(|e| SerializerError::Envelope(e.to_string()))?;

    let serialized = STANDARD
        .decode(body.message.as_bytes())
        .map_err(|e| SerializerError::Envelope(format!("message: {e}")))?;

    let expires_at = match body.exp.as_deref() {
        Some(raw) => Some(
            Metadata::parse_expires_at(raw)
                .ok_or_else(|| SerializerError::Envelope(format!("exp: {raw}")))?,
        ),
        None => None,
    };

    Ok(Some((
        serialized,
        Metadata {
            purpose: body.pur,
            expires_at,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::serializers::{JsonSerializer, LegacyObjectSerializer, PassthroughSerializer};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn purpose_only(p: &str) -> Metadata {
        Metadata {
            purpose: Some(p.to_string()),
            expires_at: None,
        }
    }

    #[test]
    fn test_no_metadata_is_bare_serializer_output() {
        let payload = Payload::from(json!({"a": 1}));
        let wrapped = wrap(&payload, None, &JsonSerializer).unwrap();
        assert_eq!(wrapped, br#"{"a":1}"#.to_vec());

        let (decoded, meta) = unwrap(&wrapped, &JsonSerializer).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(meta, None);
    }

    #[test]
    fn test_metadata_round_trip() {
        let payload = Payload::from(json!(["x", 2]));
        let meta = Metadata {
            purpose: Some("login".into()),
            expires_at: Some(Utc.with_ymd_and_hms(2031, 1, 2, 3, 4, 5).unwrap()),
        };
        let wrapped = wrap(&payload, Some(&meta), &JsonSerializer).unwrap();
        let text = String::from_utf8(wrapped.clone()).unwrap();
        assert!(text.starts_with(r#"{"_envelope":{"message":""#));
        assert!(text.contains(r#""exp":"2031-01-02T03:04:05.000Z""#));
        assert!(text.contains(r#""pur":"login""#));

        let (decoded, decoded_meta) = unwrap(&wrapped, &JsonSerializer).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded_meta, Some(meta));
    }

    #[test]
    fn test_metadata_wraps_non_json_serializers() {
        let payload = Payload::Raw(vec![0, 159, 146, 150]);
        let meta = purpose_only("upload");
        let wrapped = wrap(&payload, Some(&meta), &PassthroughSerializer).unwrap();
        let (decoded, decoded_meta) = unwrap(&wrapped, &PassthroughSerializer).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded_meta, Some(meta));
    }

    #[test]
    fn test_lookalike_payload_falls_back_to_bare() {
        // Extra top-level key: not an envelope.
        let payload = Payload::from(json!({"_envelope": {"message": "x"}, "other": 1}));
        let wrapped = wrap(&payload, None, &JsonSerializer).unwrap();
        let (decoded, meta) = unwrap(&wrapped, &JsonSerializer).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(meta, None);

        // Message is not a string: not an envelope.
        let payload = Payload::from(json!({"_envelope": {"message": 7}}));
        let wrapped = wrap(&payload, None, &JsonSerializer).unwrap();
        let (decoded, meta) = unwrap(&wrapped, &JsonSerializer).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(meta, None);

        // Extra key inside the body, or non-string exp/pur: not an envelope.
        for body in [
            json!({"message": "aGk", "note": 1}),
            json!({"message": "aGk", "exp": 1700000000}),
            json!({"message": "aGk", "pur": null}),
            json!("aGk"),
        ] {
            let payload = Payload::from(json!({ "_envelope": body }));
            let wrapped = wrap(&payload, None, &JsonSerializer).unwrap();
            let (decoded, meta) = unwrap(&wrapped, &JsonSerializer).unwrap();
            assert_eq!(decoded, payload);
            assert_eq!(meta, None);
        }
    }

    #[test]
    fn test_corrupt_envelope_is_error() {
        let bad_exp = br#"{"_envelope":{"message":"MQ","exp":"soon"}}"#;
        assert!(matches!(
            unwrap(bad_exp, &JsonSerializer),
            Err(SerializerError::Envelope(_))
        ));

        let bad_message = br#"{"_envelope":{"message":"!!!"}}"#;
        assert!(matches!(
            unwrap(bad_message, &JsonSerializer),
            Err(SerializerError::Envelope(_))
        ));
    }

    #[test]
    fn test_legacy_bytes_are_never_mistaken_for_envelope() {
        let legacy = LegacyObjectSerializer::new();
        let payload = Payload::from(json!({"k": "v"}));
        let wrapped = wrap(&payload, None, &legacy).unwrap();
        let (decoded, meta) = unwrap(&wrapped, &legacy).unwrap();
        assert_eq!(decoded, payload);
        assert!(meta.is_none());
    }

    #[test]
    fn test_serializer_failure_propagates() {
        let legacy = LegacyObjectSerializer::new();
        let wrapped = wrap(&Payload::from(json!(1)), None, &legacy).unwrap();
        assert!(matches!(
            unwrap(&wrapped, &JsonSerializer),
            Err(SerializerError::ForeignFormat { .. })
        ));
    }
}
