//! # Payload Serializers
//!
//! Implementations of the [`PayloadSerializer`] port.
//!
//! | Kind | Writes | Reads |
//! |------|--------|-------|
//! | `json` | JSON | JSON |
//! | `legacy` | legacy objects | legacy objects |
//! | `hybrid` | JSON | JSON, then legacy objects |
//! | `passthrough` | raw bytes | raw bytes |

mod hybrid;
mod json;
mod legacy;
mod passthrough;

pub use hybrid::HybridSerializer;
pub use json::JsonSerializer;
pub use legacy::{LegacyObjectSerializer, CLASS_KEY, LEGACY_MARKER};
pub use passthrough::PassthroughSerializer;

use crate::domain::errors::ConfigError;
use crate::ports::outbound::PayloadSerializer;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Serializer selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializerKind {
    #[default]
    Json,
    Legacy,
    Hybrid,
    Passthrough,
}

impl SerializerKind {
    /// Instantiate the serializer. Legacy readers resolve no object classes;
    /// build a [`LegacyObjectSerializer`] directly to register classes.
    pub fn build(&self) -> Arc<dyn PayloadSerializer> {
        match self {
            SerializerKind::Json => Arc::new(JsonSerializer),
            SerializerKind::Legacy => Arc::new(LegacyObjectSerializer::new()),
            SerializerKind::Hybrid => Arc::new(HybridSerializer::default()),
            SerializerKind::Passthrough => Arc::new(PassthroughSerializer),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SerializerKind::Json => "json",
            SerializerKind::Legacy => "legacy",
            SerializerKind::Hybrid => "hybrid",
            SerializerKind::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for SerializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SerializerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(SerializerKind::Json),
            "legacy" | "legacy-object" => Ok(SerializerKind::Legacy),
            "hybrid" => Ok(SerializerKind::Hybrid),
            "passthrough" | "null" | "none" => Ok(SerializerKind::Passthrough),
            _ => Err(ConfigError::UnknownSerializer(s.to_string())),
        }
    }
}
