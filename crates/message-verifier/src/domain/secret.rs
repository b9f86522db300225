//! # Shared Secret
//!
//! Opaque key material for HMAC computation.
//!
//! ## Security Invariants
//!
//! - Never empty: construction fails with [`ConfigError::EmptySecret`].
//! - Never printed: `Debug` is redacted and there is no `Display`.
//! - Wiped on drop via `zeroize`.

use super::errors::ConfigError;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Non-empty HMAC key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Create a secret from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    /// Create a secret from a hex string (as supplied through the environment).
    pub fn from_hex(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidSecretEncoding(e.to_string()))?;
        Self::new(bytes)
    }

    /// Borrow the key bytes for MAC computation.
    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Length is public; the bytes are compared in constant time.
impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && bool::from(self.0.ct_eq(&other.0))
    }
}

impl Eq for Secret {}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.0.len())
    }
}

impl TryFrom<&str> for Secret {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.as_bytes().to_vec())
    }
}

impl TryFrom<&[u8]> for Secret {
    type Error = ConfigError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::new(value.to_vec())
    }
}

impl TryFrom<Vec<u8>> for Secret {
    type Error = ConfigError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
