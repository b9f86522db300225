//! # Inbound Ports (Driving Ports / API)
//!
//! The public signing and verification API, plus per-call options.

use crate::domain::errors::VerifierError;
use crate::domain::payload::Payload;
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Options for a single `generate` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub purpose: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in: Option<Duration>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the token to a usage context.
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Absolute expiry. Wins over [`GenerateOptions::expires_in`].
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Expiry relative to generation time.
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires_in = Some(ttl);
        self
    }

    /// True when the token will carry a metadata envelope.
    pub fn has_metadata(&self) -> bool {
        self.purpose.is_some() || self.expires_at.is_some() || self.expires_in.is_some()
    }
}

/// Options for a single `verify` call.
#[derive(Default)]
pub struct VerifyOptions<'a> {
    pub purpose: Option<String>,
    /// Called once when the token matched a rotation candidate instead of
    /// the primary. Overrides the verifier's default hook for this call.
    pub on_rotation: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> VerifyOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn on_rotation(mut self, hook: impl FnOnce() + 'a) -> Self {
        self.on_rotation = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for VerifyOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("purpose", &self.purpose)
            .field("on_rotation", &self.on_rotation.is_some())
            .finish()
    }
}

/// Primary Message Verifier API.
///
/// Implementations must be thread-safe (`Send + Sync`). Tokens are accepted
/// as bytes so that input which is not valid UTF-8 is rejected as an invalid
/// signature instead of failing at the call site.
pub trait MessageVerifierApi: Send + Sync {
    /// Sign a payload under the primary configuration.
    ///
    /// # Errors
    /// [`VerifierError::Serialization`] when the primary serializer cannot
    /// encode the payload.
    fn generate(&self, payload: &Payload, options: GenerateOptions) -> Result<String, VerifierError>;

    /// Verify a token and return its payload.
    ///
    /// # Security
    /// Malformed tokens, MAC mismatches, purpose mismatches and expired
    /// tokens all return [`VerifierError::InvalidSignature`].
    fn verify(&self, token: &[u8], options: VerifyOptions<'_>) -> Result<Payload, VerifierError>;

    /// Like [`MessageVerifierApi::verify`], but an invalid token yields `Ok(None)`.
    ///
    /// Deserialization failures still surface as errors.
    fn verified(
        &self,
        token: &[u8],
        options: VerifyOptions<'_>,
    ) -> Result<Option<Payload>, VerifierError>;

    /// Structural pre-check. Says nothing about authenticity.
    fn valid_message(&self, token: &[u8]) -> bool;
}
