//! # Message Verifier Service
//!
//! Application service that implements [`MessageVerifierApi`].
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`MessageVerifierApi`)
//! - Uses the outbound ports (`PayloadSerializer`, `Clock`) per configuration
//! - Delegates MAC, token and envelope handling to the domain layer
//!
//! ## Verification Flow
//!
//! ```text
//! token ─► split (per candidate layout) ─► HMAC ─► constant-time compare
//!                                                       │ match
//!                                                       ▼
//!                         envelope unwrap ─► purpose check ─► expiry check
//! ```
//!
//! The first candidate whose MAC matches decides the result; later
//! candidates are never consulted.

use crate::adapters::clock::SystemClock;
use crate::adapters::serializers::JsonSerializer;
use crate::domain::digest::{self, DigestAlgorithm};
use crate::domain::envelope;
use crate::domain::errors::{ConfigError, SerializerError, VerifierError};
use crate::domain::metadata::{purpose_matches, Metadata};
use crate::domain::payload::Payload;
use crate::domain::rotation::{Rotation, RotationRegistry, VerifierConfig};
use crate::domain::secret::Secret;
use crate::ports::inbound::{GenerateOptions, MessageVerifierApi, VerifyOptions};
use crate::ports::outbound::{Clock, PayloadSerializer};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default hook run when a token verifies under a rotation candidate.
pub type RotationHook = Arc<dyn Fn() + Send + Sync>;

/// Internal result of one verification. Never exposed: the public API folds
/// every failure except `Undecodable` into `InvalidSignature`.
#[derive(Debug)]
pub(crate) enum VerificationOutcome {
    Verified {
        payload: Payload,
        metadata: Option<Metadata>,
        candidate: usize,
    },
    Malformed,
    NoMatch,
    PurposeMismatch,
    Expired,
    Undecodable(SerializerError),
}

impl VerificationOutcome {
    fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Verified { .. } => "verified",
            VerificationOutcome::Malformed => "malformed",
            VerificationOutcome::NoMatch => "no_match",
            VerificationOutcome::PurposeMismatch => "purpose_mismatch",
            VerificationOutcome::Expired => "expired",
            VerificationOutcome::Undecodable(_) => "undecodable",
        }
    }
}

/// Signs payloads under the primary configuration and verifies tokens
/// against the primary and every rotation candidate.
///
/// Immutable after [`MessageVerifierBuilder::build`]; share it freely
/// across threads.
pub struct MessageVerifier {
    registry: RotationRegistry,
    clock: Arc<dyn Clock>,
    on_rotation: Option<RotationHook>,
}

impl MessageVerifier {
    /// Start building a verifier around the primary secret.
    ///
    /// An empty secret is reported by [`MessageVerifierBuilder::build`].
    pub fn builder(secret: impl AsRef<[u8]>) -> MessageVerifierBuilder {
        MessageVerifierBuilder::from_secret_result(Secret::new(secret.as_ref()))
    }

    pub fn registry(&self) -> &RotationRegistry {
        &self.registry
    }

    /// Sign any serde value.
    pub fn generate_value<T: Serialize + ?Sized>(
        &self,
        value: &T,
        options: GenerateOptions,
    ) -> Result<String, VerifierError> {
        self.generate(&Payload::from_serialize(value)?, options)
    }

    /// Verify a token and convert its payload into `T`.
    pub fn verify_value<T: DeserializeOwned>(
        &self,
        token: impl AsRef<[u8]>,
        options: VerifyOptions<'_>,
    ) -> Result<T, VerifierError> {
        self.verify(token.as_ref(), options)?.deserialize_into()
    }

    /// Verify a token and, when it matched a rotation candidate, re-sign it
    /// under the primary configuration with the same purpose and expiry.
    ///
    /// Returns `None` for the refreshed token when the primary already
    /// matched. The rotation hook fires as in [`MessageVerifierApi::verify`].
    pub fn verify_and_rotate(
        &self,
        token: impl AsRef<[u8]>,
        options: VerifyOptions<'_>,
    ) -> Result<(Payload, Option<String>), VerifierError> {
        let VerifyOptions {
            purpose,
            on_rotation,
        } = options;
        let now = self.clock.now();

        match self.evaluate(token.as_ref(), purpose.as_deref(), now) {
            VerificationOutcome::Verified {
                payload,
                metadata,
                candidate,
            } => {
                if RotationRegistry::is_primary(candidate) {
                    return Ok((payload, None));
                }
                self.fire_rotation(on_rotation);
                let refreshed = self.sign(&payload, metadata.as_ref())?;
                info!(candidate, "re-signed rotated token under primary configuration");
                Ok((payload, Some(refreshed)))
            }
            other => Err(Self::into_error(other)),
        }
    }

    fn sign(&self, payload: &Payload, metadata: Option<&Metadata>) -> Result<String, VerifierError> {
        let primary = self.registry.primary();
        let data = envelope::wrap(payload, metadata, primary.serializer())
            .map_err(VerifierError::Serialization)?;
        // An empty data segment cannot be told apart from a truncated token.
        if data.is_empty() {
            return Err(VerifierError::Serialization(
                SerializerError::UnsupportedPayload {
                    serializer: primary.serializer().name(),
                    reason: "payload serializes to zero bytes".to_string(),
                },
            ));
        }

        let codec = primary.codec();
        let data_segment = codec.encode_data(&data);
        let mac = digest::mac(primary.secret(), primary.digest(), data_segment.as_bytes());
        Ok(codec.join(&data_segment, &mac))
    }

    pub(crate) fn evaluate(
        &self,
        token: &[u8],
        purpose: Option<&str>,
        now: DateTime<Utc>,
    ) -> VerificationOutcome {
        let mut well_formed = false;

        for (candidate, config) in self.registry.candidates() {
            let codec = config.codec();
            let Ok((data_segment, mac)) = codec.split(token) else {
                continue;
            };
            well_formed = true;

            let expected = digest::mac(config.secret(), config.digest(), data_segment.as_bytes());
            if !digest::constant_time_eq(&expected, &mac) {
                continue;
            }

            let Ok(data) = codec.decode_data(data_segment) else {
                continue;
            };
            let outcome = Self::open(config, &data, purpose, now, candidate);
            debug!(candidate, outcome = outcome.label(), "verification finished");
            return outcome;
        }

        let outcome = if well_formed {
            VerificationOutcome::NoMatch
        } else {
            VerificationOutcome::Malformed
        };
        debug!(outcome = outcome.label(), "verification finished");
        outcome
    }

    fn open(
        config: &VerifierConfig,
        data: &[u8],
        purpose: Option<&str>,
        now: DateTime<Utc>,
        candidate: usize,
    ) -> VerificationOutcome {
        let (payload, metadata) = match envelope::unwrap(data, config.serializer()) {
            Ok(opened) => opened,
            Err(error) => {
                warn!(
                    candidate,
                    serializer = config.serializer().name(),
                    %error,
                    "MAC matched but payload could not be decoded"
                );
                return VerificationOutcome::Undecodable(error);
            }
        };

        if !purpose_matches(metadata.as_ref(), purpose) {
            return VerificationOutcome::PurposeMismatch;
        }
        if metadata.as_ref().is_some_and(|m| m.is_expired(now)) {
            return VerificationOutcome::Expired;
        }

        VerificationOutcome::Verified {
            payload,
            metadata,
            candidate,
        }
    }

    fn into_error(outcome: VerificationOutcome) -> VerifierError {
        match outcome {
            VerificationOutcome::Undecodable(error) => VerifierError::Deserialization(error),
            _ => VerifierError::InvalidSignature,
        }
    }

    fn fire_rotation(&self, per_call: Option<Box<dyn FnOnce() + '_>>) {
        match (per_call, &self.on_rotation) {
            (Some(hook), _) => hook(),
            (None, Some(hook)) => hook(),
            (None, None) => {}
        }
    }

    fn resolve(&self, token: &[u8], options: VerifyOptions<'_>) -> Result<Payload, VerifierError> {
        let VerifyOptions {
            purpose,
            on_rotation,
        } = options;
        let now = self.clock.now();

        match self.evaluate(token, purpose.as_deref(), now) {
            VerificationOutcome::Verified {
                payload, candidate, ..
            } => {
                if !RotationRegistry::is_primary(candidate) {
                    let digest = self
                        .registry
                        .candidates()
                        .nth(candidate)
                        .map(|(_, c)| c.digest().name());
                    info!(candidate, ?digest, "token verified under rotation candidate");
                    self.fire_rotation(on_rotation);
                }
                Ok(payload)
            }
            other => Err(Self::into_error(other)),
        }
    }
}

impl MessageVerifierApi for MessageVerifier {
    fn generate(&self, payload: &Payload, options: GenerateOptions) -> Result<String, VerifierError> {
        let metadata = Metadata::build(
            options.purpose.as_deref(),
            options.expires_at,
            options.expires_in,
            self.clock.now(),
        )?;
        self.sign(payload, metadata.as_ref())
    }

    fn verify(&self, token: &[u8], options: VerifyOptions<'_>) -> Result<Payload, VerifierError> {
        self.resolve(token, options)
    }

    fn verified(
        &self,
        token: &[u8],
        options: VerifyOptions<'_>,
    ) -> Result<Option<Payload>, VerifierError> {
        match self.resolve(token, options) {
            Ok(payload) => Ok(Some(payload)),
            Err(VerifierError::InvalidSignature) => Ok(None),
            Err(other) => Err(other),
        }
    }

    fn valid_message(&self, token: &[u8]) -> bool {
        self.registry
            .candidates()
            .any(|(_, config)| config.codec().is_well_formed(token))
    }
}

impl fmt::Debug for MessageVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageVerifier")
            .field("registry", &self.registry)
            .field("clock", &self.clock)
            .field("on_rotation", &self.on_rotation.is_some())
            .finish()
    }
}

/// Builder for [`MessageVerifier`]. Configuration errors are collected and
/// reported by [`MessageVerifierBuilder::build`].
pub struct MessageVerifierBuilder {
    secret: Result<Secret, ConfigError>,
    digest: Result<DigestAlgorithm, ConfigError>,
    serializer: Arc<dyn PayloadSerializer>,
    url_safe: bool,
    clock: Arc<dyn Clock>,
    on_rotation: Option<RotationHook>,
    rotations: Vec<Rotation>,
}

impl MessageVerifierBuilder {
    /// Builder around an already validated secret.
    pub fn with_secret(secret: Secret) -> Self {
        Self::from_secret_result(Ok(secret))
    }

    fn from_secret_result(secret: Result<Secret, ConfigError>) -> Self {
        Self {
            secret,
            digest: Ok(DigestAlgorithm::default()),
            serializer: Arc::new(JsonSerializer),
            url_safe: false,
            clock: Arc::new(SystemClock),
            on_rotation: None,
            rotations: Vec::new(),
        }
    }

    pub fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = Ok(digest);
        self
    }

    /// Digest by identifier, e.g. `"SHA1"` or `"sha-512"`.
    pub fn digest_name(mut self, name: &str) -> Self {
        self.digest = name.parse();
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn PayloadSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn url_safe(mut self, url_safe: bool) -> Self {
        self.url_safe = url_safe;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Hook used when a verify call supplies none of its own.
    pub fn on_rotation(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_rotation = Some(Arc::new(hook));
        self
    }

    /// Register a rotation candidate. Candidates are tried in call order.
    pub fn rotate(mut self, rotation: Rotation) -> Self {
        self.rotations.push(rotation);
        self
    }

    pub fn build(self) -> Result<MessageVerifier, ConfigError> {
        let primary = VerifierConfig::new(self.secret?, self.digest?, self.serializer, self.url_safe);
        let mut registry = RotationRegistry::new(primary);
        for rotation in self.rotations {
            registry.register(rotation);
        }

        debug!(
            digest = %registry.primary().digest(),
            serializer = registry.primary().serializer().name(),
            url_safe = registry.primary().url_safe(),
            rotations = registry.candidate_count() - 1,
            "message verifier built"
        );

        Ok(MessageVerifier {
            registry,
            clock: self.clock,
            on_rotation: self.on_rotation,
        })
    }
}

impl fmt::Debug for MessageVerifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageVerifierBuilder")
            .field("secret", &self.secret)
            .field("digest", &self.digest)
            .field("serializer", &self.serializer.name())
            .field("url_safe", &self.url_safe)
            .field("rotations", &self.rotations)
            .finish()
    }
}
