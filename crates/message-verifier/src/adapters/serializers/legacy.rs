//! # Legacy Object Serializer
//!
//! Native object-graph format used by older deployments.
//!
//! ## Wire Format
//!
//! ```text
//! 0x04 0x08 | bincode(LegacyValue)
//! ```
//!
//! Objects carry a class name. Decoding an object whose class is not
//! registered with the serializer fails with
//! [`SerializerError::UnknownType`]; the class must be resolvable by the
//! reading process. In the structured payload an object appears as a JSON
//! object with a `"_class"` key.

use crate::domain::errors::SerializerError;
use crate::domain::payload::Payload;
use crate::ports::outbound::{DecodeAttempt, PayloadSerializer};
use bincode::Options;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;

/// Format marker prefixed to every legacy payload.
pub const LEGACY_MARKER: [u8; 2] = [0x04, 0x08];

/// JSON key holding an object's class name.
pub const CLASS_KEY: &str = "_class";

/// Upper bound on a decoded legacy graph, in bytes.
const MAX_LEGACY_BYTES: u64 = 16 * 1024 * 1024;

pub(crate) fn has_legacy_marker(bytes: &[u8]) -> bool {
    bytes.starts_with(&LEGACY_MARKER)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum LegacyValue {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<LegacyValue>),
    Map(Vec<(String, LegacyValue)>),
    Object {
        class: String,
        ivars: Vec<(String, LegacyValue)>,
    },
}

fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_LEGACY_BYTES)
        .reject_trailing_bytes()
}

/// Reads and writes the legacy object-graph format.
#[derive(Debug, Clone, Default)]
pub struct LegacyObjectSerializer {
    known_classes: BTreeSet<String>,
}

impl LegacyObjectSerializer {
    pub const NAME: &'static str = "legacy-object";

    /// Serializer that resolves no object classes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer that resolves the given object classes.
    pub fn with_known_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn knows_class(&self, class: &str) -> bool {
        self.known_classes.contains(class)
    }

    fn build_graph(value: &Value) -> Result<LegacyValue, SerializerError> {
        Ok(match value {
            Value::Null => LegacyValue::Nil,
            Value::Bool(b) => LegacyValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    LegacyValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    LegacyValue::UInt(u)
                } else {
                    let f = n.as_f64().ok_or_else(|| {
                        SerializerError::Legacy(format!("unrepresentable number {n}"))
                    })?;
                    LegacyValue::Float(f)
                }
            }
            Value::String(s) => LegacyValue::Str(s.clone()),
            Value::Array(items) => LegacyValue::List(
                items
                    .iter()
                    .map(Self::build_graph)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let fields = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != CLASS_KEY)
                    .map(|(k, v)| Ok((k.clone(), Self::build_graph(v)?)))
                    .collect::<Result<Vec<_>, SerializerError>>()?;
                match map.get(CLASS_KEY) {
                    Some(Value::String(class)) => LegacyValue::Object {
                        class: class.clone(),
                        ivars: fields,
                    },
                    Some(_) => {
                        return Err(SerializerError::Legacy(format!(
                            "{CLASS_KEY} must be a string"
                        )))
                    }
                    None => LegacyValue::Map(fields),
                }
            }
        })
    }

    fn resolve_graph(&self, value: LegacyValue) -> Result<Value, SerializerError> {
        Ok(match value {
            LegacyValue::Nil => Value::Null,
            LegacyValue::Bool(b) => Value::Bool(b),
            LegacyValue::Int(i) => Value::Number(i.into()),
            LegacyValue::UInt(u) => Value::Number(u.into()),
            LegacyValue::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| SerializerError::Legacy(format!("non-finite float {f}")))?,
            LegacyValue::Str(s) => Value::String(s),
            LegacyValue::List(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| self.resolve_graph(v))
                    .collect::<Result<_, _>>()?,
            ),
            LegacyValue::Map(fields) => Value::Object(self.fields_to_map(fields)?),
            LegacyValue::Object { class, ivars } => {
                if !self.knows_class(&class) {
                    return Err(SerializerError::UnknownType(class));
                }
                let mut map = self.fields_to_map(ivars)?;
                map.insert(CLASS_KEY.to_string(), Value::String(class));
                Value::Object(map)
            }
        })
    }

    fn fields_to_map(
        &self,
        fields: Vec<(String, LegacyValue)>,
    ) -> Result<Map<String, Value>, SerializerError> {
        fields
            .into_iter()
            .map(|(k, v)| Ok((k, self.resolve_graph(v)?)))
            .collect()
    }
}

impl PayloadSerializer for LegacyObjectSerializer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError> {
        let Payload::Structured(value) = payload else {
            return Err(SerializerError::UnsupportedPayload {
                serializer: Self::NAME,
                reason: "raw bytes require the passthrough serializer".to_string(),
            });
        };
        let graph = Self::build_graph(value)?;
        let body = bincode_options()
            .serialize(&graph)
            .map_err(|e| SerializerError::Legacy(e.to_string()))?;

        let mut bytes = Vec::with_capacity(LEGACY_MARKER.len() + body.len());
        bytes.extend_from_slice(&LEGACY_MARKER);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt {
        let Some(body) = bytes.strip_prefix(&LEGACY_MARKER[..]) else {
            return DecodeAttempt::NotThisFormat;
        };
        let graph: LegacyValue = match bincode_options().deserialize(body) {
            Ok(graph) => graph,
            Err(e) => return DecodeAttempt::Failed(SerializerError::Legacy(e.to_string())),
        };
        match self.resolve_graph(graph) {
            Ok(value) => DecodeAttempt::Decoded(Payload::Structured(value)),
            Err(e) => DecodeAttempt::Failed(e),
        }
    }
}
