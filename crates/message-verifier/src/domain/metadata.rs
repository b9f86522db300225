//! # Token Metadata
//!
//! Purpose binding and expiry carried inside the signed envelope.
//!
//! ## Invariants
//!
//! - Metadata exists only if the caller asked for a purpose or an expiry.
//! - An expired token is rejected even when its MAC is valid.
//! - A requested expiry is either signed as asked or refused; it is never
//!   dropped, and it always fits the four-digit-year wire form.
//! - A purpose on either side must match the other side exactly; a purpose
//!   on only one side is a mismatch.

use super::errors::VerifierError;
use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc};

/// Years the RFC 3339 wire form can carry.
const WIRE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Purpose and expiry bound to a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub purpose: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Build metadata from generation options.
    ///
    /// `expires_at` takes precedence over `expires_in`; `expires_in` is
    /// measured from `now`. Returns `Ok(None)` when nothing was requested.
    ///
    /// # Errors
    ///
    /// [`VerifierError::InvalidExpiry`] when `now + expires_in` overflows or
    /// the expiry falls outside years 0000 to 9999.
    pub fn build(
        purpose: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        expires_in: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, VerifierError> {
        let expires_at = match (expires_at, expires_in) {
            (Some(at), _) => Some(at),
            (None, Some(d)) => Some(now.checked_add_signed(d).ok_or_else(|| {
                VerifierError::InvalidExpiry(format!("{now} plus {d} overflows"))
            })?),
            (None, None) => None,
        };

        if let Some(at) = expires_at {
            if !WIRE_YEARS.contains(&at.year()) {
                return Err(VerifierError::InvalidExpiry(format!(
                    "year {} is outside {}..={}",
                    at.year(),
                    WIRE_YEARS.start(),
                    WIRE_YEARS.end()
                )));
            }
        }

        if purpose.is_none() && expires_at.is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            purpose: purpose.map(str::to_string),
            expires_at,
        }))
    }

    /// True once `now` is past the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    pub fn matches_purpose(&self, expected: Option<&str>) -> bool {
        self.purpose.as_deref() == expected
    }

    /// Wire form of the expiry: RFC 3339, UTC, millisecond precision.
    pub(crate) fn expires_at_wire(&self) -> Option<String> {
        self.expires_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub(crate) fn parse_expires_at(value: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Purpose check for a decoded envelope that may carry no metadata at all.
pub(crate) fn purpose_matches(metadata: Option<&Metadata>, expected: Option<&str>) -> bool {
    match metadata {
        Some(meta) => meta.matches_purpose(expected),
        None => expected.is_none(),
    }
}
