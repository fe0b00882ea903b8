//! In-memory KMS backend for tests
//!
//! Implements the same API seam as the REST client, with the remote
//! service's observable contract: duplicate creates fail with
//! ALREADY_EXISTS, encrypt uses the primary version and requires it to be
//! enabled, decrypt resolves the version that produced the ciphertext so
//! rotation does not orphan old ciphertext.
//!
//! Each version carries its own AES-256-GCM key; ciphertext is framed as
//! a 4-byte big-endian version id, a 12-byte nonce, then the sealed
//! payload.
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
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use cloudkeys_types::{
    CryptoKey, CryptoKeyName, CryptoKeyVersion, CryptoKeyVersionName, CryptoKeyVersionState,
    DecryptResponse, EncryptResponse, KeyRing, KeyRingName, LocationName,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

const NONCE_LEN: usize = 12;
const VERSION_PREFIX_LEN: usize = 4;

struct VersionEntry {
    state: CryptoKeyVersionState,
    create_time: DateTime<Utc>,
    key: [u8; 32],
}

impl VersionEntry {
    fn new() -> Self {
        use rand::RngCore;

        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);

        Self {
            state: CryptoKeyVersionState::Enabled,
            create_time: Utc::now(),
            key,
        }
    }
}

struct KeyEntry {
    resource: CryptoKey,
    primary: u32,
    next_version: u32,
    versions: BTreeMap<u32, VersionEntry>,
}

#[derive(Default)]
struct State {
    /// Key ring specifier -> ring resource.
    rings: HashMap<String, KeyRing>,
    /// Crypto key specifier -> key entry.
    keys: HashMap<String, KeyEntry>,
}

/// In-memory stand-in for the remote KMS
#[derive(Default)]
pub struct InMemoryKms {
    state: RwLock<State>,
}

impl InMemoryKms {
    pub fn new() -> Self {
        Self::default()
    }
}

fn already_exists(name: &str) -> KmsError {
    KmsError::Api {
        code: 409,
        status: "ALREADY_EXISTS".to_string(),
        message: format!("{} already exists", name),
    }
}

fn not_found(name: &str) -> KmsError {
    KmsError::Api {
        code: 404,
        status: "NOT_FOUND".to_string(),
        message: format!("{} not found", name),
    }
}

fn failed_precondition(message: String) -> KmsError {
    KmsError::Api {
        code: 400,
        status: "FAILED_PRECONDITION".to_string(),
        message,
    }
}

fn invalid_argument(message: String) -> KmsError {
    KmsError::Api {
        code: 400,
        status: "INVALID_ARGUMENT".to_string(),
        message,
    }
}

fn internal(message: String) -> KmsError {
    KmsError::Api {
        code: 500,
        status: "INTERNAL".to_string(),
        message,
    }
}

fn version_specifier(key_specifier: &str, version_id: u32) -> String {
    format!("{}/cryptoKeyVersions/{}", key_specifier, version_id)
}

fn version_resource(key_specifier: &str, version_id: u32, entry: &VersionEntry) -> CryptoKeyVersion {
    CryptoKeyVersion {
        name: Some(version_specifier(key_specifier, version_id)),
        state: Some(entry.state),
        create_time: Some(entry.create_time),
    }
}

impl KeyEntry {
    fn resource_view(&self, key_specifier: &str) -> CryptoKey {
        let mut resource = self.resource.clone();
        resource.primary = self
            .versions
            .get(&self.primary)
            .map(|entry| version_resource(key_specifier, self.primary, entry));
        resource
    }
}

#[async_trait]
impl KeyManagementApi for InMemoryKms {
    async fn create_key_ring(
        &self,
        parent: &LocationName,
        key_ring_id: &str,
    ) -> KmsResult<KeyRing> {
        let specifier = format!("{}/keyRings/{}", parent, key_ring_id);

        let mut state = self.state.write().await;
        if state.rings.contains_key(&specifier) {
            return Err(already_exists(&specifier));
        }

        let ring = KeyRing {
            name: Some(specifier.clone()),
            create_time: Some(Utc::now()),
        };
        state.rings.insert(specifier, ring.clone());

        Ok(ring)
    }

    async fn get_key_ring(&self, name: &KeyRingName) -> KmsResult<KeyRing> {
        let specifier = name.to_string();

        let state = self.state.read().await;
        state
            .rings
            .get(&specifier)
            .cloned()
            .ok_or_else(|| not_found(&specifier))
    }

    async fn create_crypto_key(
        &self,
        parent: &KeyRingName,
        crypto_key_id: &str,
        crypto_key: CryptoKey,
    ) -> KmsResult<CryptoKey> {
        let ring_specifier = parent.to_string();
        let specifier = format!("{}/cryptoKeys/{}", parent, crypto_key_id);

        let mut state = self.state.write().await;
        if !state.rings.contains_key(&ring_specifier) {
            return Err(not_found(&ring_specifier));
        }
        if state.keys.contains_key(&specifier) {
            return Err(already_exists(&specifier));
        }

        let mut resource = crypto_key;
        resource.name = Some(specifier.clone());
        resource.create_time = Some(Utc::now());

        // The service materializes an initial enabled version and makes
        // it primary.
        let mut versions = BTreeMap::new();
        versions.insert(1, VersionEntry::new());

        let entry = KeyEntry {
            resource,
            primary: 1,
            next_version: 2,
            versions,
        };
        let view = entry.resource_view(&specifier);
        state.keys.insert(specifier, entry);

        Ok(view)
    }

    async fn get_crypto_key(&self, name: &CryptoKeyName) -> KmsResult<CryptoKey> {
        let specifier = name.to_string();

        let state = self.state.read().await;
        let entry = state.keys.get(&specifier).ok_or_else(|| not_found(&specifier))?;

        Ok(entry.resource_view(&specifier))
    }

    async fn create_crypto_key_version(
        &self,
        parent: &CryptoKeyName,
    ) -> KmsResult<CryptoKeyVersion> {
        let specifier = parent.to_string();

        let mut state = self.state.write().await;
        let entry = state
            .keys
            .get_mut(&specifier)
            .ok_or_else(|| not_found(&specifier))?;

        let version_id = entry.next_version;
        entry.next_version += 1;
        let version = VersionEntry::new();
        let resource = version_resource(&specifier, version_id, &version);
        entry.versions.insert(version_id, version);

        Ok(resource)
    }

    async fn update_primary_version(
        &self,
        name: &CryptoKeyName,
        version_id: &str,
    ) -> KmsResult<CryptoKey> {
        let specifier = name.to_string();
        let version_id: u32 = version_id
            .parse()
            .map_err(|_| invalid_argument(format!("Invalid version id: {}", version_id)))?;

        let mut state = self.state.write().await;
        let entry = state
            .keys
            .get_mut(&specifier)
            .ok_or_else(|| not_found(&specifier))?;

        let version = entry
            .versions
            .get(&version_id)
            .ok_or_else(|| not_found(&version_specifier(&specifier, version_id)))?;
        if version.state != CryptoKeyVersionState::Enabled {
            return Err(failed_precondition(format!(
                "{} is not enabled",
                version_specifier(&specifier, version_id)
            )));
        }

        entry.primary = version_id;

        Ok(entry.resource_view(&specifier))
    }

    async fn update_version_state(
        &self,
        name: &CryptoKeyVersionName,
        new_state: CryptoKeyVersionState,
    ) -> KmsResult<CryptoKeyVersion> {
        let key_specifier = name.crypto_key().to_string();
        let version_id: u32 = name
            .version_id()
            .parse()
            .map_err(|_| invalid_argument(format!("Invalid version id: {}", name.version_id())))?;

        let mut state = self.state.write().await;
        let entry = state
            .keys
            .get_mut(&key_specifier)
            .ok_or_else(|| not_found(&key_specifier))?;

        let version = entry
            .versions
            .get_mut(&version_id)
            .ok_or_else(|| not_found(&name.to_string()))?;
        version.state = new_state;

        Ok(version_resource(&key_specifier, version_id, version))
    }

    async fn get_crypto_key_version(
        &self,
        name: &CryptoKeyVersionName,
    ) -> KmsResult<CryptoKeyVersion> {
        let key_specifier = name.crypto_key().to_string();
        let version_id: u32 = name
            .version_id()
            .parse()
            .map_err(|_| invalid_argument(format!("Invalid version id: {}", name.version_id())))?;

        let state = self.state.read().await;
        let entry = state
            .keys
            .get(&key_specifier)
            .ok_or_else(|| not_found(&key_specifier))?;
        let version = entry
            .versions
            .get(&version_id)
            .ok_or_else(|| not_found(&name.to_string()))?;

        Ok(version_resource(&key_specifier, version_id, version))
    }

    async fn encrypt(&self, name: &CryptoKeyName, plaintext: &[u8]) -> KmsResult<EncryptResponse> {
        let specifier = name.to_string();

        let state = self.state.read().await;
        let entry = state.keys.get(&specifier).ok_or_else(|| not_found(&specifier))?;

        let primary_id = entry.primary;
        let version = entry
            .versions
            .get(&primary_id)
            .ok_or_else(|| not_found(&version_specifier(&specifier, primary_id)))?;
        if version.state != CryptoKeyVersionState::Enabled {
            return Err(failed_precondition(format!(
                "{} is not enabled",
                version_specifier(&specifier, primary_id)
            )));
        }

        let cipher = Aes256Gcm::new(&version.key.into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| internal(format!("Encryption failed: {}", e)))?;

        let mut payload = Vec::with_capacity(VERSION_PREFIX_LEN + NONCE_LEN + sealed.len());
        payload.extend_from_slice(&primary_id.to_be_bytes());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);

        Ok(EncryptResponse {
            name: version_specifier(&specifier, primary_id),
            ciphertext: BASE64.encode(payload),
        })
    }

    async fn decrypt(
        &self,
        name: &CryptoKeyName,
        ciphertext: &[u8],
    ) -> KmsResult<DecryptResponse> {
        let specifier = name.to_string();

        if ciphertext.len() < VERSION_PREFIX_LEN + NONCE_LEN {
            return Err(invalid_argument("Ciphertext too short".to_string()));
        }
        let (prefix, rest) = ciphertext.split_at(VERSION_PREFIX_LEN);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);
        let version_id = u32::from_be_bytes(prefix.try_into().expect("prefix is 4 bytes"));

        let state = self.state.read().await;
        let entry = state.keys.get(&specifier).ok_or_else(|| not_found(&specifier))?;
        let version = entry
            .versions
            .get(&version_id)
            .ok_or_else(|| not_found(&version_specifier(&specifier, version_id)))?;
        if version.state != CryptoKeyVersionState::Enabled {
            return Err(failed_precondition(format!(
                "{} is not enabled",
                version_specifier(&specifier, version_id)
            )));
        }

        let cipher = Aes256Gcm::new(&version.key.into());
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| invalid_argument("Decryption failed".to_string()))?;

        Ok(DecryptResponse {
            plaintext: BASE64.encode(plaintext),
        })
    }
}
