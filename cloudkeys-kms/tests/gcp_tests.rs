//! Live Cloud KMS Tests
//!
//! These hit the real service: they need a settings file or CLOUDKEYS_*
//! environment, plus a service account with KMS admin and crypt
//! permissions. Key rings cannot be deleted, so they reuse the
//! configured test ring.

use cloudkeys_config::AppConfig;
use cloudkeys_kms::{KeyLifecycle, KmsClient, KmsClientConfig, ServiceAccountKey};
use std::sync::Arc;

async fn live_demo() -> KeyLifecycle {
    let config = AppConfig::load().unwrap();
    let credentials_file = config
        .credentials_file
        .clone()
        .expect("GOOGLE_APPLICATION_CREDENTIALS not set");

    let key = ServiceAccountKey::from_file(&credentials_file).await.unwrap();
    let client = KmsClient::new(
        key,
        KmsClientConfig {
            endpoint: config.endpoint.clone(),
            ..Default::default()
        },
    )
    .unwrap();

    KeyLifecycle::new(
        Arc::new(client),
        &config.project_id,
        &config.location_id,
        &config.key_ring_id,
        &config.key_id,
    )
}

#[tokio::test]
#[ignore] // Requires GCP credentials and a real project
async fn test_live_get_or_create_resources() {
    let demo = live_demo().await;

    let ring = demo.create_key_ring().await.unwrap();
    assert!(ring.name.is_some());

    let key = demo.create_symmetric_key().await.unwrap();
    assert!(key.name.is_some());
}

#[tokio::test]
#[ignore] // Requires GCP credentials and a real project
async fn test_live_encrypt_decrypt_round_trip() {
    let demo = live_demo().await;
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let encrypted = demo.encrypt("I love pizza!").await.unwrap();
    let decrypted = demo.decrypt(&encrypted.ciphertext).await.unwrap();
    assert_eq!(decrypted, "I love pizza!");

    let version = demo.get_key_version(&encrypted.key_version).await.unwrap();
    assert_eq!(version.name.as_deref(), Some(encrypted.key_version.as_str()));
}

#[tokio::test]
#[ignore] // Requires GCP credentials and a real project
async fn test_live_rotate_and_disable() {
    let demo = live_demo().await;
    demo.create_key_ring().await.unwrap();
    demo.create_symmetric_key().await.unwrap();

    let before = demo.encrypt("I love pizza!").await.unwrap();

    let rotated = demo.rotate_key().await.unwrap();
    let new_primary = rotated.primary.unwrap().name.unwrap();
    assert_ne!(before.key_version, new_primary);

    // Pre-rotation ciphertext still decrypts through the old version.
    assert_eq!(demo.decrypt(&before.ciphertext).await.unwrap(), "I love pizza!");
}
