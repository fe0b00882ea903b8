//! REST client for Cloud KMS
//!
//! Each operation is a single HTTP round trip: no retries, no local
//! state beyond the client handle and the token cache.
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
use crate::auth::{AccessTokenProvider, ServiceAccountKey};
use crate::error::{KmsError, KmsResult};
use async_trait::async_trait;
use cloudkeys_types::{
    CryptoKey, CryptoKeyName, CryptoKeyVersion, CryptoKeyVersionName, CryptoKeyVersionState,
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorBody, KeyRing,
    KeyRingName, LocationName, UpdatePrimaryVersionRequest,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Client configuration
#[derive(Debug, Clone)]
pub struct KmsClientConfig {
    /// Override for the service endpoint; tests point this at a local
    /// stand-in.
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for KmsClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 30,
        }
    }
}

/// Cloud KMS REST client
pub struct KmsClient {
    config: KmsClientConfig,
    auth: AccessTokenProvider,
    http: reqwest::Client,
}

impl KmsClient {
    pub fn new(key: ServiceAccountKey, config: KmsClientConfig) -> KmsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;

        let auth = AccessTokenProvider::new(key, http.clone())?;

        Ok(Self { config, auth, http })
    }

    fn base_url(&self) -> &str {
        self.config
            .endpoint
            .as_deref()
            .unwrap_or("https://cloudkms.googleapis.com")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url(), path)
    }

    /// Attach a bearer token, send, and decode either the typed response
    /// or the Google error body.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> KmsResult<T> {
        let token = self.auth.token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&error_text) {
            Ok(body) => Err(KmsError::from_status(body.error)),
            Err(_) => Err(KmsError::InvalidResponse(format!(
                "KMS API error ({}): {}",
                status, error_text
            ))),
        }
    }
}

#[async_trait]
impl KeyManagementApi for KmsClient {
    async fn create_key_ring(
        &self,
        parent: &LocationName,
        key_ring_id: &str,
    ) -> KmsResult<KeyRing> {
        debug!(parent = %parent, key_ring_id, "POST keyRings");

        let request = self
            .http
            .post(self.url(&format!("{}/keyRings", parent)))
            .query(&[("keyRingId", key_ring_id)])
            .json(&KeyRing::default());

        self.send(request).await
    }

    async fn get_key_ring(&self, name: &KeyRingName) -> KmsResult<KeyRing> {
        debug!(name = %name, "GET keyRing");

        self.send(self.http.get(self.url(&name.to_string()))).await
    }

    async fn create_crypto_key(
        &self,
        parent: &KeyRingName,
        crypto_key_id: &str,
        crypto_key: CryptoKey,
    ) -> KmsResult<CryptoKey> {
        debug!(parent = %parent, crypto_key_id, "POST cryptoKeys");

        let request = self
            .http
            .post(self.url(&format!("{}/cryptoKeys", parent)))
            .query(&[("cryptoKeyId", crypto_key_id)])
            .json(&crypto_key);

        self.send(request).await
    }

    async fn get_crypto_key(&self, name: &CryptoKeyName) -> KmsResult<CryptoKey> {
        debug!(name = %name, "GET cryptoKey");

        self.send(self.http.get(self.url(&name.to_string()))).await
    }

    async fn create_crypto_key_version(
        &self,
        parent: &CryptoKeyName,
    ) -> KmsResult<CryptoKeyVersion> {
        debug!(parent = %parent, "POST cryptoKeyVersions");

        let request = self
            .http
            .post(self.url(&format!("{}/cryptoKeyVersions", parent)))
            .json(&CryptoKeyVersion::default());

        self.send(request).await
    }

    async fn update_primary_version(
        &self,
        name: &CryptoKeyName,
        version_id: &str,
    ) -> KmsResult<CryptoKey> {
        debug!(name = %name, version_id, "POST :updatePrimaryVersion");

        let request = self
            .http
            .post(self.url(&format!("{}:updatePrimaryVersion", name)))
            .json(&UpdatePrimaryVersionRequest {
                crypto_key_version_id: version_id.to_string(),
            });

        self.send(request).await
    }

    async fn update_version_state(
        &self,
        name: &CryptoKeyVersionName,
        state: CryptoKeyVersionState,
    ) -> KmsResult<CryptoKeyVersion> {
        debug!(name = %name, state = ?state, "PATCH cryptoKeyVersion state");

        let request = self
            .http
            .patch(self.url(&name.to_string()))
            .query(&[("updateMask", "state")])
            .json(&serde_json::json!({ "state": state }));

        self.send(request).await
    }

    async fn get_crypto_key_version(
        &self,
        name: &CryptoKeyVersionName,
    ) -> KmsResult<CryptoKeyVersion> {
        debug!(name = %name, "GET cryptoKeyVersion");

        self.send(self.http.get(self.url(&name.to_string()))).await
    }

    async fn encrypt(&self, name: &CryptoKeyName, plaintext: &[u8]) -> KmsResult<EncryptResponse> {
        debug!(name = %name, bytes = plaintext.len(), "POST :encrypt");

        let request = self
            .http
            .post(self.url(&format!("{}:encrypt", name)))
            .json(&EncryptRequest::from_bytes(plaintext));

        self.send(request).await
    }

    async fn decrypt(
        &self,
        name: &CryptoKeyName,
        ciphertext: &[u8],
    ) -> KmsResult<DecryptResponse> {
        debug!(name = %name, bytes = ciphertext.len(), "POST :decrypt");

        let request = self
            .http
            .post(self.url(&format!("{}:decrypt", name)))
            .json(&DecryptRequest::from_bytes(ciphertext));

        self.send(request).await
    }
}
