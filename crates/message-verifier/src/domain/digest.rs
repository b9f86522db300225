//! # Digest & Comparator
//!
//! Keyed MAC computation and constant-time comparison.
//!
//! ## Security Notes
//!
//! - HMAC accepts keys of any length, so `mac` cannot fail once a
//!   [`Secret`] exists (secrets are non-empty by construction).
//! - [`constant_time_eq`] uses `subtle` so the comparison time does not
//!   depend on the position of the first differing byte.

use super::errors::ConfigError;
use super::secret::Secret;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Hash function used inside the HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    Sha1,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Canonical identifier.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    /// MAC length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    /// Accepts `SHA1`, `sha256`, `SHA-512` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(DigestAlgorithm::Sha1),
            "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(ConfigError::UnknownDigest(s.to_string())),
        }
    }
}

/// Compute HMAC(`secret`, `data`) with the given hash.
pub fn mac(secret: &Secret, algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        DigestAlgorithm::Sha1 => compute::<HmacSha1>(secret.expose(), data),
        DigestAlgorithm::Sha256 => compute::<HmacSha256>(secret.expose(), data),
        DigestAlgorithm::Sha384 => compute::<HmacSha384>(secret.expose(), data),
        DigestAlgorithm::Sha512 => compute::<HmacSha512>(secret.expose(), data),
    }
}

fn compute<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compare two byte strings in constant time.
///
/// Returns `false` straight away when the lengths differ; MAC lengths are
/// public, so this leaks nothing.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Secret {
        Secret::try_from(s).unwrap()
    }

    #[test]
    fn test_output_lengths() {
        let key = secret("key");
        for algorithm in [
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            assert_eq!(mac(&key, algorithm, b"data").len(), algorithm.output_len());
        }
    }

    #[test]
    fn test_keys_longer_than_block_size() {
        // Longer than the 128-byte SHA-512 block, so HMAC hashes the key first.
        let long = Secret::new(vec![0xaa; 200]).unwrap();
        let short = secret("k");
        for algorithm in [DigestAlgorithm::Sha1, DigestAlgorithm::Sha512] {
            let tag = mac(&long, algorithm, b"data");
            assert_eq!(tag.len(), algorithm.output_len());
            assert_ne!(tag, mac(&short, algorithm, b"data"));
        }
    }

    #[test]
    fn test_hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let key = secret("Jefe");
        let tag = mac(
            &key,
            DigestAlgorithm::Sha256,
            b"what do ya want for nothing?",
        );
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        // RFC 2202 test case 2
        let key = secret("Jefe");
        let tag = mac(&key, DigestAlgorithm::Sha1, b"what do ya want for nothing?");
        assert_eq!(hex::encode(tag), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn test_different_keys_produce_different_macs() {
        let a = mac(&secret("one"), DigestAlgorithm::Sha256, b"payload");
        let b = mac(&secret("two"), DigestAlgorithm::Sha256, b"payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_digest_names() {
        assert_eq!("SHA1".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha1));
        assert_eq!("sha256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert_eq!("SHA-384".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha384));
        assert_eq!("sha_512".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha512));
    }

    #[test]
    fn test_parse_unknown_digest_fails() {
        assert_eq!(
            "MD5".parse::<DigestAlgorithm>(),
            Err(ConfigError::UnknownDigest("MD5".to_string()))
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }
}
