//! High-level key lifecycle wrapper
//!
//! Translates the demo's five intents into remote calls against one
//! configured crypto key, normalizing "already exists" into an
//! idempotent get-or-create. Every other fault propagates unchanged.
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


use crate::api::KeyManagementApi;
use crate::error::{KmsError, KmsResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Duration, Utc};
use cloudkeys_types::{
    proto_duration, CryptoKey, CryptoKeyName, CryptoKeyPurpose, CryptoKeyVersion,
    CryptoKeyVersionAlgorithm, CryptoKeyVersionName, CryptoKeyVersionState,
    CryptoKeyVersionTemplate, KeyRing, KeyRingName, LocationName,
};
use std::sync::Arc;
use tracing::info;

/// Cloud KMS rejects symmetric encrypt payloads over 64 KiB.
pub const MAX_PLAINTEXT_BYTES: usize = 65536;

/// Result of an encrypt call: the transport-encoded ciphertext and the
/// specifier of the version that produced it.
#[derive(Debug, Clone)]
pub struct EncryptOutcome {
    pub ciphertext: String,
    pub key_version: String,
}

/// Key lifecycle demo wrapper over a KMS backend
///
/// Holds the four identifiers naming the demo's crypto key; all state
/// lives behind the backend.
pub struct KeyLifecycle {
    api: Arc<dyn KeyManagementApi>,
    project_id: String,
    location_id: String,
    key_ring_id: String,
    key_id: String,
}

impl KeyLifecycle {
    pub fn new(
        api: Arc<dyn KeyManagementApi>,
        project_id: impl Into<String>,
        location_id: impl Into<String>,
        key_ring_id: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            project_id: project_id.into(),
            location_id: location_id.into(),
            key_ring_id: key_ring_id.into(),
            key_id: key_id.into(),
        }
    }

    fn location_name(&self) -> LocationName {
        LocationName::new(self.project_id.clone(), self.location_id.clone())
    }

    fn key_ring_name(&self) -> KeyRingName {
        KeyRingName::new(
            self.project_id.clone(),
            self.location_id.clone(),
            self.key_ring_id.clone(),
        )
    }

    fn crypto_key_name(&self) -> CryptoKeyName {
        CryptoKeyName::new(
            self.project_id.clone(),
            self.location_id.clone(),
            self.key_ring_id.clone(),
            self.key_id.clone(),
        )
    }

    fn version_name(&self, version_id: &str) -> CryptoKeyVersionName {
        CryptoKeyVersionName::new(
            self.project_id.clone(),
            self.location_id.clone(),
            self.key_ring_id.clone(),
            self.key_id.clone(),
            version_id,
        )
    }

    /// Create the key ring, or fetch it if it already exists.
    pub async fn create_key_ring(&self) -> KmsResult<KeyRing> {
        info!(key_ring = %self.key_ring_id, "Creating key ring");

        match self
            .api
            .create_key_ring(&self.location_name(), &self.key_ring_id)
            .await
        {
            Ok(ring) => Ok(ring),
            Err(e) if e.is_already_exists() => {
                info!(key_ring = %self.key_ring_id, "Key ring already exists, fetching it");
                self.api.get_key_ring(&self.key_ring_name()).await
            }
            Err(e) => Err(e),
        }
    }

    /// Create the symmetric encrypt/decrypt key, or fetch it if it
    /// already exists.
    ///
    /// New keys rotate once a year, starting in 24 hours.
    pub async fn create_symmetric_key(&self) -> KmsResult<CryptoKey> {
        info!(key = %self.key_id, "Creating symmetric key");

        let crypto_key = CryptoKey {
            purpose: Some(CryptoKeyPurpose::EncryptDecrypt),
            version_template: Some(CryptoKeyVersionTemplate {
                algorithm: CryptoKeyVersionAlgorithm::GoogleSymmetricEncryption,
            }),
            rotation_period: Some(proto_duration(Duration::days(365))),
            next_rotation_time: Some(Utc::now() + Duration::hours(24)),
            ..Default::default()
        };

        match self
            .api
            .create_crypto_key(&self.key_ring_name(), &self.key_id, crypto_key)
            .await
        {
            Ok(key) => Ok(key),
            Err(e) if e.is_already_exists() => {
                info!(key = %self.key_id, "Crypto key already exists, fetching it");
                self.api.get_crypto_key(&self.crypto_key_name()).await
            }
            Err(e) => Err(e),
        }
    }

    /// Encrypt a string with the key's primary version.
    pub async fn encrypt(&self, plaintext: &str) -> KmsResult<EncryptOutcome> {
        let bytes = plaintext.as_bytes();
        if bytes.len() > MAX_PLAINTEXT_BYTES {
            return Err(KmsError::PlaintextTooLarge {
                size: bytes.len(),
                limit: MAX_PLAINTEXT_BYTES,
            });
        }

        let response = self.api.encrypt(&self.crypto_key_name(), bytes).await?;

        Ok(EncryptOutcome {
            ciphertext: response.ciphertext,
            key_version: response.name,
        })
    }

    /// Decrypt base64 ciphertext back to a string.
    pub async fn decrypt(&self, ciphertext: &str) -> KmsResult<String> {
        let bytes = BASE64.decode(ciphertext)?;

        let response = self.api.decrypt(&self.crypto_key_name(), &bytes).await?;

        let plaintext = response.plaintext_bytes()?;
        String::from_utf8(plaintext)
            .map_err(|e| KmsError::InvalidResponse(format!("Plaintext is not UTF-8: {}", e)))
    }

    /// Rotate the key: create a new version and promote it to primary.
    ///
    /// Old versions stay enabled so previously encrypted data still
    /// decrypts.
    pub async fn rotate_key(&self) -> KmsResult<CryptoKey> {
        let name = self.crypto_key_name();

        let new_version = self.api.create_crypto_key_version(&name).await?;
        let specifier = new_version
            .name
            .as_deref()
            .ok_or_else(|| KmsError::InvalidResponse("Created version has no name".to_string()))?;
        let version_id = CryptoKeyVersionName::parse(specifier)?.version_id;

        info!(key = %self.key_id, version = %version_id, "Promoting new primary version");

        self.api.update_primary_version(&name, &version_id).await
    }

    /// Disable a specific key version via a state-only partial update.
    pub async fn disable_key_version(&self, version_id: &str) -> KmsResult<CryptoKeyVersion> {
        info!(key = %self.key_id, version = %version_id, "Disabling key version");

        self.api
            .update_version_state(
                &self.version_name(version_id),
                CryptoKeyVersionState::Disabled,
            )
            .await
    }

    /// Fetch a key version by its full specifier.
    pub async fn get_key_version(&self, specifier: &str) -> KmsResult<CryptoKeyVersion> {
        let name = CryptoKeyVersionName::parse(specifier)?;
        self.api.get_crypto_key_version(&name).await
    }
}
