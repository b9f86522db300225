//! # Rotation and Compatibility Tests
//!
//! Tokens signed under retired secrets, digests, alphabets and serializers
//! must keep verifying while new tokens are signed under the primary.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use message_verifier::{
    DecodeAttempt, DigestAlgorithm, GenerateOptions, HybridSerializer, JsonSerializer,
    LegacyObjectSerializer, MessageVerifier, MessageVerifierApi, Payload, PayloadSerializer,
    Rotation, Secret, SerializerError, VerifierError, VerifyOptions,
};
use serde_json::json;
use sha2::Sha256;
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn secret(s: &str) -> Secret {
    Secret::try_from(s).unwrap()
}

fn payload() -> Payload {
    Payload::from(json!({"user_id": 123, "roles": ["reader"]}))
}

fn sign_with(secret: &str, digest: DigestAlgorithm) -> String {
    MessageVerifier::builder(secret)
        .digest(digest)
        .build()
        .unwrap()
        .generate(&payload(), GenerateOptions::default())
        .unwrap()
}

/// Serializer that counts decode calls and otherwise behaves like JSON.
#[derive(Debug, Default)]
struct CountingSerializer {
    decodes: AtomicUsize,
}

impl PayloadSerializer for CountingSerializer {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, SerializerError> {
        JsonSerializer.encode(payload)
    }

    fn try_decode(&self, bytes: &[u8]) -> DecodeAttempt {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        JsonSerializer.try_decode(bytes)
    }
}

// =============================================================================
// SECRET AND DIGEST ROTATION
// =============================================================================

#[test]
fn test_sha1_token_verifies_under_sha512_primary() {
    let token = sign_with("old", DigestAlgorithm::Sha1);

    let verifier = MessageVerifier::builder("current secret")
        .digest(DigestAlgorithm::Sha512)
        .rotate(Rotation::new().secret(secret("old")).digest(DigestAlgorithm::Sha1))
        .build()
        .unwrap();

    let calls = Cell::new(0u32);
    let verified = verifier
        .verify(
            token.as_bytes(),
            VerifyOptions::new().on_rotation(|| calls.set(calls.get() + 1)),
        )
        .unwrap();

    assert_eq!(verified, payload());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_new_tokens_use_primary_only() {
    let verifier = MessageVerifier::builder("current secret")
        .digest(DigestAlgorithm::Sha512)
        .rotate(Rotation::new().secret(secret("old")).digest(DigestAlgorithm::Sha1))
        .build()
        .unwrap();
    let token = verifier.generate(&payload(), GenerateOptions::default()).unwrap();

    let primary_only = MessageVerifier::builder("current secret")
        .digest(DigestAlgorithm::Sha512)
        .build()
        .unwrap();
    assert_eq!(
        primary_only.verify(token.as_bytes(), VerifyOptions::default()).unwrap(),
        payload()
    );

    let fired = Cell::new(false);
    verifier
        .verify(token.as_bytes(), VerifyOptions::new().on_rotation(|| fired.set(true)))
        .unwrap();
    assert!(!fired.get());
}

#[test]
fn test_multiple_rotations_are_tried_in_order() {
    let older_token = sign_with("older", DigestAlgorithm::Sha1);

    let only_old = MessageVerifier::builder("current")
        .rotate(Rotation::new().secret(secret("old")).digest(DigestAlgorithm::Sha256))
        .build()
        .unwrap();
    assert_eq!(
        only_old.verify(older_token.as_bytes(), VerifyOptions::default()),
        Err(VerifierError::InvalidSignature)
    );

    let both = MessageVerifier::builder("current")
        .rotate(Rotation::new().secret(secret("old")).digest(DigestAlgorithm::Sha256))
        .rotate(Rotation::new().secret(secret("older")).digest(DigestAlgorithm::Sha1))
        .build()
        .unwrap();
    let calls = Cell::new(0u32);
    let verified = both
        .verify(
            older_token.as_bytes(),
            VerifyOptions::new().on_rotation(|| calls.set(calls.get() + 1)),
        )
        .unwrap();
    assert_eq!(verified, payload());
    assert_eq!(calls.get(), 1);

    let old_token = sign_with("old", DigestAlgorithm::Sha256);
    assert_eq!(
        both.verify(old_token.as_bytes(), VerifyOptions::default()).unwrap(),
        payload()
    );
}

#[test]
fn test_alphabet_rotation() {
    let standard = MessageVerifier::builder("shared").build().unwrap();
    let token = standard
        .generate(&Payload::from(json!("\u{fb}\u{ff}\u{fe}")), GenerateOptions::default())
        .unwrap();

    let url_safe = MessageVerifier::builder("shared")
        .url_safe(true)
        .rotate(Rotation::new().url_safe(false))
        .build()
        .unwrap();
    assert_eq!(
        url_safe.verify(token.as_bytes(), VerifyOptions::default()).unwrap(),
        Payload::from(json!("\u{fb}\u{ff}\u{fe}"))
    );
}

#[test]
fn test_only_mac_matching_candidate_deserializes() {
    let counting = Arc::new(CountingSerializer::default());
    let verifier = MessageVerifier::builder("current")
        .rotate(
            Rotation::new()
                .secret(secret("old"))
                .serializer(Arc::clone(&counting) as Arc<dyn PayloadSerializer>),
        )
        .build()
        .unwrap();

    let forged = sign_with("attacker", DigestAlgorithm::Sha256);
    assert!(verifier
        .verified(forged.as_bytes(), VerifyOptions::default())
        .unwrap()
        .is_none());
    assert_eq!(counting.decodes.load(Ordering::SeqCst), 0);

    let old = sign_with("old", DigestAlgorithm::Sha256);
    verifier.verify(old.as_bytes(), VerifyOptions::default()).unwrap();
    assert_eq!(counting.decodes.load(Ordering::SeqCst), 1);
}

// =============================================================================
// RE-SIGNING
// =============================================================================

#[test]
fn test_verify_and_rotate_refreshes_retired_tokens() {
    let old = MessageVerifier::builder("old")
        .digest(DigestAlgorithm::Sha1)
        .build()
        .unwrap();
    let token = old
        .generate(&payload(), GenerateOptions::new().purpose("password_reset"))
        .unwrap();

    let verifier = MessageVerifier::builder("new")
        .digest(DigestAlgorithm::Sha384)
        .rotate(Rotation::new().secret(secret("old")).digest(DigestAlgorithm::Sha1))
        .build()
        .unwrap();

    let (verified, refreshed) = verifier
        .verify_and_rotate(&token, VerifyOptions::new().purpose("password_reset"))
        .unwrap();
    assert_eq!(verified, payload());
    let refreshed = refreshed.expect("retired token is re-signed");

    let primary_only = MessageVerifier::builder("new")
        .digest(DigestAlgorithm::Sha384)
        .build()
        .unwrap();
    assert_eq!(
        primary_only
            .verify(refreshed.as_bytes(), VerifyOptions::new().purpose("password_reset"))
            .unwrap(),
        payload()
    );
    assert_eq!(
        primary_only.verified(refreshed.as_bytes(), VerifyOptions::default()).unwrap(),
        None
    );
}

// =============================================================================
// BACKWARD-COMPATIBLE FORMATS
// =============================================================================

#[test]
fn test_hand_built_bare_token_verifies() {
    // <base64(json)>--<base64(hmac_sha256(secret, base64(json)))>
    let data = STANDARD_NO_PAD.encode(br#"{"user_id":123,"roles":["reader"]}"#);
    let mut mac = Hmac::<Sha256>::new_from_slice(b"shared").unwrap();
    mac.update(data.as_bytes());
    let token = format!(
        "{data}--{}",
        STANDARD_NO_PAD.encode(mac.finalize().into_bytes())
    );

    let verifier = MessageVerifier::builder("shared").build().unwrap();
    assert_eq!(
        verifier.verify(token.as_bytes(), VerifyOptions::default()).unwrap(),
        payload()
    );
}

#[test]
fn test_legacy_token_with_json_serializer_is_deserialization_error() {
    let legacy = MessageVerifier::builder("shared")
        .serializer(Arc::new(LegacyObjectSerializer::new()))
        .build()
        .unwrap();
    let token = legacy.generate(&payload(), GenerateOptions::default()).unwrap();

    let json = MessageVerifier::builder("shared").build().unwrap();
    let err = json
        .verify(token.as_bytes(), VerifyOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        VerifierError::Deserialization(SerializerError::ForeignFormat {
            expected: "json",
            found: "legacy-object",
        })
    );
    assert!(!err.is_invalid_signature());
}

#[test]
fn test_hybrid_reads_legacy_and_writes_json() {
    let classes = ["Session"];
    let legacy = MessageVerifier::builder("shared")
        .serializer(Arc::new(LegacyObjectSerializer::with_known_classes(classes)))
        .build()
        .unwrap();
    let session = Payload::from(json!({"_class": "Session", "id": 5}));
    let legacy_token = legacy.generate(&session, GenerateOptions::default()).unwrap();

    let hybrid = MessageVerifier::builder("shared")
        .serializer(Arc::new(HybridSerializer::new(
            LegacyObjectSerializer::with_known_classes(classes),
        )))
        .build()
        .unwrap();
    assert_eq!(
        hybrid.verify(legacy_token.as_bytes(), VerifyOptions::default()).unwrap(),
        session
    );

    let fresh = hybrid.generate(&session, GenerateOptions::default()).unwrap();
    let json = MessageVerifier::builder("shared").build().unwrap();
    assert_eq!(
        json.verify(fresh.as_bytes(), VerifyOptions::default()).unwrap(),
        session
    );
}

#[test]
fn test_unknown_legacy_class_is_not_masked() {
    let writer = MessageVerifier::builder("shared")
        .serializer(Arc::new(LegacyObjectSerializer::with_known_classes(["Admin"])))
        .build()
        .unwrap();
    let token = writer
        .generate(&Payload::from(json!({"_class": "Admin"})), GenerateOptions::default())
        .unwrap();

    let reader = MessageVerifier::builder("shared")
        .serializer(Arc::new(HybridSerializer::default()))
        .build()
        .unwrap();
    assert_eq!(
        reader.verified(token.as_bytes(), VerifyOptions::default()),
        Err(VerifierError::Deserialization(SerializerError::UnknownType(
            "Admin".to_string()
        )))
    );
}

#[test]
fn test_serializer_rotation_migrates_legacy_tokens() {
    let legacy_token = MessageVerifier::builder("old")
        .serializer(Arc::new(LegacyObjectSerializer::new()))
        .build()
        .unwrap()
        .generate(&payload(), GenerateOptions::default())
        .unwrap();

    let verifier = MessageVerifier::builder("new")
        .rotate(
            Rotation::new()
                .secret(secret("old"))
                .serializer(Arc::new(LegacyObjectSerializer::new())),
        )
        .build()
        .unwrap();

    let (verified, refreshed) = verifier
        .verify_and_rotate(&legacy_token, VerifyOptions::default())
        .unwrap();
    assert_eq!(verified, payload());

    let refreshed = refreshed.unwrap();
    let data = refreshed.split_once("--").unwrap().0;
    assert_eq!(
        STANDARD_NO_PAD.decode(data).unwrap(),
        br#"{"roles":["reader"],"user_id":123}"#.to_vec()
    );
}
