//! # Rotation Registry
//!
//! Ordered verification configurations. Index 0 is the primary and the only
//! configuration used for signing; the rest are rotation candidates kept to
//! verify tokens issued under retired secrets or digests.
//!
//! Candidates are tried in registration order and the first MAC match wins,
//! so register the most likely retired configuration first.

use super::digest::DigestAlgorithm;
use super::secret::Secret;
use super::token::{TokenCodec, TokenEncoding};
use crate::ports::outbound::PayloadSerializer;
use std::fmt;
use std::sync::Arc;

/// One complete signing/verification configuration. Immutable once built.
#[derive(Clone)]
pub struct VerifierConfig {
    secret: Secret,
    digest: DigestAlgorithm,
    serializer: Arc<dyn PayloadSerializer>,
    url_safe: bool,
}

impl VerifierConfig {
    pub fn new(
        secret: Secret,
        digest: DigestAlgorithm,
        serializer: Arc<dyn PayloadSerializer>,
        url_safe: bool,
    ) -> Self {
        Self {
            secret,
            digest,
            serializer,
            url_safe,
        }
    }

    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    pub fn serializer(&self) -> &dyn PayloadSerializer {
        self.serializer.as_ref()
    }

    pub fn url_safe(&self) -> bool {
        self.url_safe
    }

    /// Token layout implied by this configuration's alphabet and digest.
    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(
            TokenEncoding::from_url_safe(self.url_safe),
            self.digest.output_len(),
        )
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("secret", &self.secret)
            .field("digest", &self.digest)
            .field("serializer", &self.serializer.name())
            .field("url_safe", &self.url_safe)
            .finish()
    }
}

/// Overrides for a rotation candidate. Unset fields inherit from the primary.
#[derive(Clone, Default)]
pub struct Rotation {
    secret: Option<Secret>,
    digest: Option<DigestAlgorithm>,
    serializer: Option<Arc<dyn PayloadSerializer>>,
    url_safe: Option<bool>,
}

impl Rotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn PayloadSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn url_safe(mut self, url_safe: bool) -> Self {
        self.url_safe = Some(url_safe);
        self
    }

    fn resolve(self, primary: &VerifierConfig) -> VerifierConfig {
        VerifierConfig {
            secret: self.secret.unwrap_or_else(|| primary.secret.clone()),
            digest: self.digest.unwrap_or(primary.digest),
            serializer: self
                .serializer
                .unwrap_or_else(|| Arc::clone(&primary.serializer)),
            url_safe: self.url_safe.unwrap_or(primary.url_safe),
        }
    }
}

impl fmt::Debug for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rotation")
            .field("secret", &self.secret)
            .field("digest", &self.digest)
            .field("serializer", &self.serializer.as_ref().map(|s| s.name()))
            .field("url_safe", &self.url_safe)
            .finish()
    }
}

/// Primary configuration followed by rotation candidates.
#[derive(Debug, Clone)]
pub struct RotationRegistry {
    candidates: Vec<VerifierConfig>,
}

impl RotationRegistry {
    pub fn new(primary: VerifierConfig) -> Self {
        Self {
            candidates: vec![primary],
        }
    }

    /// Append a candidate; returns its position in the trial order.
    pub fn register(&mut self, rotation: Rotation) -> usize {
        let config = rotation.resolve(self.primary());
        self.candidates.push(config);
        self.candidates.len() - 1
    }

    pub fn primary(&self) -> &VerifierConfig {
        // The vector is created with the primary and never shrinks.
        &self.candidates[0]
    }

    /// Primary first, then rotations in registration order.
    pub fn candidates(&self) -> impl Iterator<Item = (usize, &VerifierConfig)> {
        self.candidates.iter().enumerate()
    }

    pub fn is_primary(index: usize) -> bool {
        index == 0
    }

    /// Number of candidates, the primary included. Never zero.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}
