//! The Cloud KMS API seam
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


use crate::error::KmsResult;
use async_trait::async_trait;
use cloudkeys_types::{
    CryptoKey, CryptoKeyName, CryptoKeyVersion, CryptoKeyVersionName, CryptoKeyVersionState,
    DecryptResponse, EncryptResponse, KeyRing, KeyRingName, LocationName,
};

/// The remote Cloud KMS operations the demo exercises
///
/// Implemented by [`crate::KmsClient`] against the real service and by
/// [`crate::InMemoryKms`] for tests.
#[async_trait]
pub trait KeyManagementApi: Send + Sync {
    /// Create a key ring under a location.
    async fn create_key_ring(
        &self,
        parent: &LocationName,
        key_ring_id: &str,
    ) -> KmsResult<KeyRing>;

    /// Fetch an existing key ring.
    async fn get_key_ring(&self, name: &KeyRingName) -> KmsResult<KeyRing>;

    /// Create a crypto key under a key ring. The service materializes an
    /// initial enabled version and makes it primary.
    async fn create_crypto_key(
        &self,
        parent: &KeyRingName,
        crypto_key_id: &str,
        crypto_key: CryptoKey,
    ) -> KmsResult<CryptoKey>;

    /// Fetch an existing crypto key.
    async fn get_crypto_key(&self, name: &CryptoKeyName) -> KmsResult<CryptoKey>;

    /// Create a new version under a crypto key. The new version is not
    /// primary until promoted.
    async fn create_crypto_key_version(
        &self,
        parent: &CryptoKeyName,
    ) -> KmsResult<CryptoKeyVersion>;

    /// Promote a version to primary, so subsequent encrypts use it.
    async fn update_primary_version(
        &self,
        name: &CryptoKeyName,
        version_id: &str,
    ) -> KmsResult<CryptoKey>;

    /// Partial update of a version, field mask restricted to `state`.
    async fn update_version_state(
        &self,
        name: &CryptoKeyVersionName,
        state: CryptoKeyVersionState,
    ) -> KmsResult<CryptoKeyVersion>;

    /// Fetch a single crypto key version.
    async fn get_crypto_key_version(
        &self,
        name: &CryptoKeyVersionName,
    ) -> KmsResult<CryptoKeyVersion>;

    /// Encrypt plaintext with the key's primary version.
    async fn encrypt(&self, name: &CryptoKeyName, plaintext: &[u8]) -> KmsResult<EncryptResponse>;

    /// Decrypt ciphertext produced by any version of the key.
    async fn decrypt(&self, name: &CryptoKeyName, ciphertext: &[u8])
        -> KmsResult<DecryptResponse>;
}
