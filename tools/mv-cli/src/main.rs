//! mv-cli: sign and verify message-verifier tokens from the shell.
//!
//! Configuration comes from the environment (`MV_SECRET`, `MV_DIGEST`,
//! `MV_SERIALIZER`, `MV_URL_SAFE`, `MV_ROTATE_<n>_*`); see
//! [`message_verifier::VerifierSettings::from_env`].

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use message_verifier::{
    GenerateOptions, MessageVerifier, MessageVerifierApi, Payload, VerifierError,
    VerifierSettings, VerifyOptions,
};

/// mv-cli: tamper-evident token signer and verifier
#[derive(Parser, Debug)]
#[command(name = "mv-cli")]
#[command(about = "Sign payloads into tokens and verify tokens back into payloads")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign a payload and print the token
    Generate {
        /// Payload as JSON text (or raw text with --raw)
        payload: String,

        /// Bind the token to a purpose
        #[arg(long)]
        purpose: Option<String>,

        /// Expire the token this many seconds from now
        #[arg(long, value_name = "SECS")]
        expires_in: Option<i64>,

        /// Expire the token at an RFC 3339 instant (wins over --expires-in)
        #[arg(long, value_name = "RFC3339")]
        expires_at: Option<DateTime<Utc>>,

        /// Sign the payload bytes as-is (requires MV_SERIALIZER=passthrough)
        #[arg(long)]
        raw: bool,
    },

    /// Verify a token and print its payload
    Verify {
        token: String,

        /// Purpose the token must be bound to
        #[arg(long)]
        purpose: Option<String>,

        /// Print a token re-signed under the primary key when a rotation key matched
        #[arg(long)]
        refresh: bool,
    },

    /// Check that a token is structurally well formed (no authenticity check)
    Check { token: String },
}

fn init_tracing() {
    let filter = std::env::var("MV_LOG_LEVEL")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_verifier() -> Result<MessageVerifier> {
    let settings = VerifierSettings::from_env().context("failed to read MV_* configuration")?;
    debug!(
        digest = %settings.digest,
        serializer = %settings.serializer,
        rotations = settings.rotations.len(),
        "configuration loaded"
    );
    settings
        .into_verifier()
        .context("failed to build verifier")
}

fn render(payload: &Payload) -> Result<String> {
    match payload {
        Payload::Structured(value) => Ok(serde_json::to_string_pretty(value)?),
        Payload::Raw(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn generate(
    verifier: &MessageVerifier,
    payload: String,
    purpose: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
    raw: bool,
) -> Result<ExitCode> {
    let payload = if raw {
        Payload::Raw(payload.into_bytes())
    } else {
        Payload::Structured(serde_json::from_str(&payload).context("payload is not valid JSON")?)
    };

    let mut options = GenerateOptions::new();
    if let Some(purpose) = purpose {
        options = options.purpose(purpose);
    }
    if let Some(secs) = expires_in {
        let ttl = Duration::try_seconds(secs).context("--expires-in out of range")?;
        options = options.expires_in(ttl);
    }
    if let Some(at) = expires_at {
        options = options.expires_at(at);
    }

    let token = verifier.generate(&payload, options)?;
    println!("{token}");
    Ok(ExitCode::SUCCESS)
}

fn verify(
    verifier: &MessageVerifier,
    token: String,
    purpose: Option<String>,
    refresh: bool,
) -> Result<ExitCode> {
    let mut options = VerifyOptions::new().on_rotation(|| {
        eprintln!("note: token was signed with a retired key");
    });
    if let Some(purpose) = purpose {
        options = options.purpose(purpose);
    }

    let result = if refresh {
        verifier.verify_and_rotate(&token, options)
    } else {
        verifier
            .verify(token.as_bytes(), options)
            .map(|payload| (payload, None))
    };

    match result {
        Ok((payload, refreshed)) => {
            println!("{}", render(&payload)?);
            if let Some(refreshed) = refreshed {
                info!("issued refreshed token");
                println!("{refreshed}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(VerifierError::InvalidSignature) => {
            eprintln!("invalid signature");
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other.into()),
    }
}

fn check(verifier: &MessageVerifier, token: String) -> ExitCode {
    if verifier.valid_message(token.as_bytes()) {
        println!("well-formed");
        ExitCode::SUCCESS
    } else {
        println!("malformed");
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let verifier = load_verifier()?;

    match args.command {
        Command::Generate {
            payload,
            purpose,
            expires_in,
            expires_at,
            raw,
        } => generate(&verifier, payload, purpose, expires_in, expires_at, raw),
        Command::Verify {
            token,
            purpose,
            refresh,
        } => verify(&verifier, token, purpose, refresh),
        Command::Check { token } => Ok(check(&verifier, token)),
    }
}
