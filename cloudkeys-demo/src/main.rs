//! Cloudkeys Demo
//!
//! Walks the full key lifecycle against Cloud KMS: create a key ring and
//! a symmetric key (both idempotent), encrypt and decrypt a short string,
//! look up the version that produced the ciphertext, rotate the key, and
//! disable the pre-rotation version.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use anyhow::Context;
use cloudkeys_config::AppConfig;
use cloudkeys_kms::{KeyLifecycle, KmsClient, KmsClientConfig, ServiceAccountKey};
use cloudkeys_logging::init_console_logging;
use cloudkeys_types::CryptoKeyVersionName;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log level can come from it
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_console_logging("cloudkeys-demo", config.log_level());

    info!(project = %config.project_id, "Starting Cloudkeys demo");

    // Build the KMS client from the service account credential blob
    let credentials_file = config.credentials_file.clone().context(
        "No service account key configured (set credentials_file or GOOGLE_APPLICATION_CREDENTIALS)",
    )?;
    let service_account = ServiceAccountKey::from_file(&credentials_file)
        .await
        .with_context(|| format!("Failed to load service account key from {}", credentials_file))?;

    let client = KmsClient::new(
        service_account,
        KmsClientConfig {
            endpoint: config.endpoint.clone(),
            ..Default::default()
        },
    )?;

    let demo = KeyLifecycle::new(
        Arc::new(client),
        &config.project_id,
        &config.location_id,
        &config.key_ring_id,
        &config.key_id,
    );

    // Create a key ring
    demo.create_key_ring().await?;

    // Create a key
    let key = demo.create_symmetric_key().await?;
    info!(key = key.name.as_deref().unwrap_or("<unnamed>"), "Crypto key ready");

    // Test out encryption/decryption
    let plaintext = "I love pizza!";
    let encrypted = demo.encrypt(plaintext).await?;
    let decrypted = demo.decrypt(&encrypted.ciphertext).await?;
    let version = demo.get_key_version(&encrypted.key_version).await?;
    let version_name = CryptoKeyVersionName::parse(&encrypted.key_version)?;
    info!(state = ?version.state, "Fetched the key version used for encryption");

    println!();
    println!("Encryption Results:");
    println!("Key Version ID: {}", version_name.version_id());
    println!("Cipher Text: {}", encrypted.ciphertext);
    println!("Decrypted value: {}", decrypted);
    println!();

    // Rotate to a fresh primary version, then disable the version that
    // produced the ciphertext above. Already-encrypted data would keep
    // decrypting until the old version is disabled.
    let rotated = demo.rotate_key().await?;
    let new_primary = rotated
        .primary
        .as_ref()
        .and_then(|v| v.name.as_deref())
        .unwrap_or("<unknown>");
    info!(primary = new_primary, "Key rotated");

    let disabled = demo.disable_key_version(version_name.version_id()).await?;
    info!(
        version = disabled.name.as_deref().unwrap_or("<unnamed>"),
        state = ?disabled.state,
        "Old key version disabled"
    );

    println!("Rotation Results:");
    println!("New Primary Version: {}", new_primary);
    println!("Disabled Version ID: {}", version_name.version_id());
    println!();

    Ok(())
}
