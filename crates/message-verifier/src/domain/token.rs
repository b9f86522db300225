//! # Token Codec
//!
//! Joins a data segment and a MAC into `<data>--<mac>` and splits it back.
//!
//! ## Wire Format
//!
//! Both segments are base64 without padding, using either the standard or the
//! URL-safe alphabet. The MAC width is fixed per digest, so the separator is
//! located by position (`len - mac_width - 2`) rather than by searching.
//! With the standard alphabet this is the same as requiring exactly one `--`,
//! since `-` is not a valid character. With the URL-safe alphabet, where `-`
//! is valid, it keeps a data segment ending in `-` unambiguous.
//!
//! Every structural failure is a [`TokenError::Malformed`]; low-level base64
//! errors never escape this module.

use super::errors::TokenError;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;

/// Separator between data and MAC segments.
pub const SEPARATOR: &str = "--";

/// Binary-to-text alphabet for both token segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenEncoding {
    /// `A-Z a-z 0-9 + /`
    #[default]
    Standard,
    /// `A-Z a-z 0-9 - _`
    UrlSafe,
}

impl TokenEncoding {
    pub fn from_url_safe(url_safe: bool) -> Self {
        if url_safe {
            TokenEncoding::UrlSafe
        } else {
            TokenEncoding::Standard
        }
    }

    fn engine(&self) -> &'static base64::engine::GeneralPurpose {
        match self {
            TokenEncoding::Standard => &STANDARD_NO_PAD,
            TokenEncoding::UrlSafe => &URL_SAFE_NO_PAD,
        }
    }
}

/// Codec bound to one configuration's alphabet and MAC width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCodec {
    encoding: TokenEncoding,
    mac_len: usize,
}

impl TokenCodec {
    pub fn new(encoding: TokenEncoding, mac_len: usize) -> Self {
        Self { encoding, mac_len }
    }

    /// Encoded width of the MAC segment (unpadded base64).
    pub fn mac_segment_len(&self) -> usize {
        unpadded_len(self.mac_len)
    }

    /// Encode the data bytes into the text segment the MAC is computed over.
    pub fn encode_data(&self, data: &[u8]) -> String {
        self.encoding.engine().encode(data)
    }

    /// Append the encoded MAC to an already encoded data segment.
    pub fn join(&self, data_segment: &str, mac: &[u8]) -> String {
        let mac_segment = self.encoding.engine().encode(mac);
        let mut token =
            String::with_capacity(data_segment.len() + SEPARATOR.len() + mac_segment.len());
        token.push_str(data_segment);
        token.push_str(SEPARATOR);
        token.push_str(&mac_segment);
        token
    }

    /// Encode both parts into a complete token.
    pub fn encode(&self, data: &[u8], mac: &[u8]) -> String {
        self.join(&self.encode_data(data), mac)
    }

    /// Split a token into its encoded data segment and decoded MAC bytes.
    ///
    /// The data segment is returned still encoded because the MAC covers the
    /// encoded text; it is validated as decodable here so callers can rely
    /// on [`TokenCodec::decode_data`] succeeding.
    pub(crate) fn split<'a>(&self, token: &'a [u8]) -> Result<(&'a str, Vec<u8>), TokenError> {
        let token = std::str::from_utf8(token)
            .map_err(|_| TokenError::Malformed("token is not valid UTF-8"))?;

        let mac_width = self.mac_segment_len();
        let Some(sep_at) = token.len().checked_sub(mac_width + SEPARATOR.len()) else {
            return Err(TokenError::Malformed("token shorter than MAC segment"));
        };
        if sep_at == 0 {
            return Err(TokenError::Malformed("empty data segment"));
        }
        if token.get(sep_at..sep_at + SEPARATOR.len()) != Some(SEPARATOR) {
            return Err(TokenError::Malformed("separator not found"));
        }

        let data_segment = &token[..sep_at];
        let mac_segment = &token[sep_at + SEPARATOR.len()..];

        if self.decode_data(data_segment)?.is_empty() {
            return Err(TokenError::Malformed("empty data segment"));
        }
        let mac = self
            .encoding
            .engine()
            .decode(mac_segment)
            .map_err(|_| TokenError::Malformed("invalid MAC segment encoding"))?;
        if mac.len() != self.mac_len {
            return Err(TokenError::Malformed("MAC segment has wrong length"));
        }

        Ok((data_segment, mac))
    }

    /// Decode a data segment previously accepted by [`TokenCodec::split`].
    pub(crate) fn decode_data(&self, data_segment: &str) -> Result<Vec<u8>, TokenError> {
        self.encoding
            .engine()
            .decode(data_segment)
            .map_err(|_| TokenError::Malformed("invalid data segment encoding"))
    }

    /// Decode a token into `(data_bytes, mac_bytes)`.
    pub(crate) fn decode(&self, token: &[u8]) -> Result<(Vec<u8>, Vec<u8>), TokenError> {
        let (data_segment, mac) = self.split(token)?;
        let data = self.decode_data(data_segment)?;
        Ok((data, mac))
    }

    /// Structural pre-check: the token decodes to two non-empty segments.
    pub fn is_well_formed(&self, token: impl AsRef<[u8]>) -> bool {
        self.decode(token.as_ref()).is_ok()
    }
}

/// Length of unpadded base64 for `n` bytes.
fn unpadded_len(n: usize) -> usize {
    (n * 4).div_ceil(3)
}
