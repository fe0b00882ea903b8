//! Key Lifecycle Tests
//!
//! Run the demo wrapper against the in-memory backend, which reproduces
//! the remote service's observable contract.

use cloudkeys_kms::lifecycle::MAX_PLAINTEXT_BYTES;
use cloudkeys_kms::{InMemoryKms, KeyLifecycle, KmsError};
use cloudkeys_types::CryptoKeyVersionState;
use std::sync::Arc;

fn demo() -> KeyLifecycle {
    KeyLifecycle::new(
        Arc::new(InMemoryKms::new()),
        "test-project",
        "global",
        "test-ring",
        "test-key",
    )
}

#[tokio::test]
async fn test_create_key_ring_is_idempotent() {
    let demo = demo();

    let first = demo.create_key_ring().await.unwrap();
    let second = demo.create_key_ring().await.unwrap();

    assert_eq!(first.name, second.name);
    assert_eq!(
        first.name.as_deref(),
        Some("projects/test-project/locations/global/keyRings/test-ring")
    );
}

#[tokio::test]
async fn test_create_symmetric_key_is_idempotent() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();

    let first = demo.create_symmetric_key().await.unwrap();
    let second = demo.create_symmetric_key().await.unwrap();

    assert_eq!(first.name, second.name);
    assert_eq!(
        first.name.as_deref(),
        Some("projects/test-project/locations/global/keyRings/test-ring/cryptoKeys/test-key")
    );
    assert_eq!(first.rotation_period.as_deref(), Some("31536000s"));
}

#[tokio::test]
async fn test_create_key_without_ring_propagates_not_found() {
    let demo = demo();

    let result = demo.create_symmetric_key().await;
    match result {
        Err(KmsError::Api { status, .. }) => assert_eq!(status, "NOT_FOUND"),
        other => panic!("Expected NOT_FOUND, got {:?}", other.map(|k| k.name)),
    }
}

#[tokio::test]
async fn test_encrypt_decrypt_round_trip() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let encrypted = demo.encrypt("I love pizza!").await.unwrap();
    assert_ne!(encrypted.ciphertext, "I love pizza!");

    let decrypted = demo.decrypt(&encrypted.ciphertext).await.unwrap();
    assert_eq!(decrypted, "I love pizza!");
}

#[tokio::test]
async fn test_encrypt_reports_the_version_used() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let encrypted = demo.encrypt("I love pizza!").await.unwrap();
    assert!(encrypted
        .key_version
        .starts_with("projects/test-project/locations/global/keyRings/test-ring/cryptoKeys/test-key/cryptoKeyVersions/"));

    let version = demo.get_key_version(&encrypted.key_version).await.unwrap();
    assert_eq!(version.name.as_deref(), Some(encrypted.key_version.as_str()));
    assert_eq!(version.state, Some(CryptoKeyVersionState::Enabled));
}

#[tokio::test]
async fn test_rotation_promotes_a_new_primary() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    let key = demo.create_symmetric_key().await.unwrap();
    let old_primary = key.primary.unwrap().name.unwrap();

    let rotated = demo.rotate_key().await.unwrap();
    let new_primary = rotated.primary.unwrap().name.unwrap();

    assert_ne!(old_primary, new_primary);
}

#[tokio::test]
async fn test_old_ciphertext_survives_rotation() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let before = demo.encrypt("I love pizza!").await.unwrap();
    demo.rotate_key().await.unwrap();
    let after = demo.encrypt("I love pizza!").await.unwrap();

    // New encrypts use the new primary, old ciphertext still decrypts.
    assert_ne!(before.key_version, after.key_version);
    assert_eq!(demo.decrypt(&before.ciphertext).await.unwrap(), "I love pizza!");
    assert_eq!(demo.decrypt(&after.ciphertext).await.unwrap(), "I love pizza!");
}

#[tokio::test]
async fn test_encrypt_with_disabled_primary_is_rejected() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let encrypted = demo.encrypt("I love pizza!").await.unwrap();
    let version_id = encrypted.key_version.rsplit('/').next().unwrap();

    let disabled = demo.disable_key_version(version_id).await.unwrap();
    assert_eq!(disabled.state, Some(CryptoKeyVersionState::Disabled));

    let result = demo.encrypt("I love pizza!").await;
    match result {
        Err(KmsError::Api { status, .. }) => assert_eq!(status, "FAILED_PRECONDITION"),
        other => panic!("Expected FAILED_PRECONDITION, got {:?}", other.map(|o| o.key_version)),
    }
}

#[tokio::test]
async fn test_oversized_plaintext_is_rejected_locally() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let oversized = "a".repeat(MAX_PLAINTEXT_BYTES + 1);
    let result = demo.encrypt(&oversized).await;

    match result {
        Err(KmsError::PlaintextTooLarge { size, limit }) => {
            assert_eq!(size, MAX_PLAINTEXT_BYTES + 1);
            assert_eq!(limit, MAX_PLAINTEXT_BYTES);
        }
        other => panic!("Expected PlaintextTooLarge, got {:?}", other.map(|o| o.key_version)),
    }

    // The limit itself is still accepted.
    let exact = "a".repeat(MAX_PLAINTEXT_BYTES);
    assert!(demo.encrypt(&exact).await.is_ok());
}

#[tokio::test]
async fn test_decrypt_rejects_invalid_base64() {
    let demo = demo();
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let result = demo.decrypt("!!!not base64!!!").await;
    assert!(matches!(result, Err(KmsError::Decode(_))));
}
