//! Verifier configuration from environment variables.

use crate::adapters::serializers::SerializerKind;
use crate::domain::digest::DigestAlgorithm;
use crate::domain::errors::ConfigError;
use crate::domain::rotation::Rotation;
use crate::domain::secret::Secret;
use crate::service::{MessageVerifier, MessageVerifierBuilder};
use std::env;

/// Prefix shared by every variable read here.
pub const ENV_PREFIX: &str = "MV_";

/// Overrides for one rotation candidate. Unset fields inherit the primary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationSettings {
    pub secret: Option<Secret>,
    pub digest: Option<DigestAlgorithm>,
    pub serializer: Option<SerializerKind>,
    pub url_safe: Option<bool>,
}

impl RotationSettings {
    fn into_rotation(self) -> Rotation {
        let mut rotation = Rotation::new();
        if let Some(secret) = self.secret {
            rotation = rotation.secret(secret);
        }
        if let Some(digest) = self.digest {
            rotation = rotation.digest(digest);
        }
        if let Some(kind) = self.serializer {
            rotation = rotation.serializer(kind.build());
        }
        if let Some(url_safe) = self.url_safe {
            rotation = rotation.url_safe(url_safe);
        }
        rotation
    }
}

/// Complete verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    /// Primary secret, used for signing
    pub secret: Secret,

    /// Primary digest
    pub digest: DigestAlgorithm,

    /// Primary serializer
    pub serializer: SerializerKind,

    /// Whether tokens use the URL-safe alphabet
    pub url_safe: bool,

    /// Rotation candidates, in trial order
    pub rotations: Vec<RotationSettings>,
}

impl VerifierSettings {
    /// Settings with defaults for everything but the secret.
    pub fn new(secret: Secret) -> Self {
        Self {
            secret,
            digest: DigestAlgorithm::default(),
            serializer: SerializerKind::default(),
            url_safe: false,
            rotations: Vec::new(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MV_SECRET`: Primary secret, hex encoded (required)
    /// - `MV_DIGEST`: SHA1, SHA256, SHA384 or SHA512 (default: SHA256)
    /// - `MV_SERIALIZER`: json, legacy, hybrid or passthrough (default: json)
    /// - `MV_URL_SAFE`: Use the URL-safe alphabet (default: false)
    /// - `MV_ROTATE_<n>_SECRET`, `MV_ROTATE_<n>_DIGEST`,
    ///   `MV_ROTATE_<n>_SERIALIZER`, `MV_ROTATE_<n>_URL_SAFE`: rotation `n`,
    ///   numbered from 1 without gaps. Unset fields inherit the primary.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`VerifierSettings::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("MV_SECRET").ok_or(ConfigError::MissingSetting("MV_SECRET"))?;
        let mut settings = Self::new(Secret::from_hex(secret.trim())?);

        if let Some(digest) = lookup("MV_DIGEST") {
            settings.digest = digest.parse()?;
        }
        if let Some(serializer) = lookup("MV_SERIALIZER") {
            settings.serializer = serializer.parse()?;
        }
        if let Some(url_safe) = lookup("MV_URL_SAFE") {
            settings.url_safe = parse_flag("MV_URL_SAFE", &url_safe)?;
        }

        for n in 1.. {
            let var = |field: &str| format!("{ENV_PREFIX}ROTATE_{n}_{field}");
            let secret = lookup(&var("SECRET"));
            let digest = lookup(&var("DIGEST"));
            let serializer = lookup(&var("SERIALIZER"));
            let url_safe = lookup(&var("URL_SAFE"));

            if secret.is_none() && digest.is_none() && serializer.is_none() && url_safe.is_none() {
                break;
            }

            settings.rotations.push(RotationSettings {
                secret: secret.map(|s| Secret::from_hex(s.trim())).transpose()?,
                digest: digest.map(|d| d.parse::<DigestAlgorithm>()).transpose()?,
                serializer: serializer.map(|s| s.parse::<SerializerKind>()).transpose()?,
                url_safe: url_safe
                    .map(|u| parse_flag(&var("URL_SAFE"), &u))
                    .transpose()?,
            });
        }

        Ok(settings)
    }

    /// Build the verifier these settings describe.
    pub fn into_verifier(self) -> Result<MessageVerifier, ConfigError> {
        let mut builder = MessageVerifierBuilder::with_secret(self.secret)
            .digest(self.digest)
            .serializer(self.serializer.build())
            .url_safe(self.url_safe);
        for rotation in self.rotations {
            builder = builder.rotate(rotation.into_rotation());
        }
        builder.build()
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
