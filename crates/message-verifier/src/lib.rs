//! # Message Verifier
//!
//! Tamper-evident tokens for payloads that travel through untrusted hands:
//! cookies, signed URLs, tokens passed between processes that share a secret.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): MAC, token layout, envelope, rotation registry
//! - **Ports Layer** (`ports/`): Inbound API and outbound serializer/clock traits
//! - **Adapters Layer** (`adapters/`): Serializers and clocks
//! - **Service Layer** (`service.rs`): The signing/verification engine
//!
//! ## Token Format
//!
//! ```text
//! base64(envelope) "--" base64(HMAC(secret, base64(envelope)))
//! ```
//!
//! Both segments are unpadded, standard or URL-safe alphabet.
//!
//! ## Security Notes
//!
//! - **Constant-time comparison**: MACs are compared with `subtle`
//! - **No oracle**: Forged, malformed, expired and wrong-purpose tokens all
//!   fail with [`VerifierError::InvalidSignature`]
//! - **Rotation**: Only the primary configuration signs; rotation candidates
//!   only verify
//! - **Secrets**: Zeroized on drop, redacted from `Debug` output
//!
//! ## Example
//!
//! ```
//! use message_verifier::{GenerateOptions, MessageVerifier, MessageVerifierApi, Payload, VerifyOptions};
//! use serde_json::json;
//!
//! let verifier = MessageVerifier::builder("s3cr3t").build()?;
//! let token = verifier.generate(
//!     &Payload::from(json!({"user_id": 7})),
//!     GenerateOptions::new().purpose("login"),
//! )?;
//!
//! let payload = verifier.verify(token.as_bytes(), VerifyOptions::new().purpose("login"))?;
//! assert_eq!(payload, Payload::from(json!({"user_id": 7})));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::clock::{ManualClock, SystemClock};
pub use adapters::serializers::{
    HybridSerializer, JsonSerializer, LegacyObjectSerializer, PassthroughSerializer,
    SerializerKind,
};
pub use config::{RotationSettings, VerifierSettings};
pub use domain::digest::DigestAlgorithm;
pub use domain::errors::{ConfigError, SerializerError, VerifierError};
pub use domain::metadata::Metadata;
pub use domain::payload::Payload;
pub use domain::rotation::{Rotation, RotationRegistry, VerifierConfig};
pub use domain::secret::Secret;
pub use domain::token::TokenEncoding;
pub use ports::inbound::{GenerateOptions, MessageVerifierApi, VerifyOptions};
pub use ports::outbound::{Clock, DecodeAttempt, PayloadSerializer};
pub use service::{MessageVerifier, MessageVerifierBuilder, RotationHook};
