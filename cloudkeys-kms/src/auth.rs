//! Service account authentication
//!
//! The demo authenticates the way the official clients do when handed a
//! credential blob: an RS256-signed JWT assertion exchanged for a short
//! lived access token at the service account's token endpoint (the OAuth
//! 2.0 JWT-bearer grant). The token is cached and refreshed shortly
//! before expiry.
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


use crate::error::{KmsError, KmsResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// OAuth scope covering all Cloud KMS operations.
const CLOUDKMS_SCOPE: &str = "https://www.googleapis.com/auth/cloudkms";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The token endpoint caps assertion lifetimes at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token expires.
const EXPIRY_SLACK_SECS: i64 = 60;

/// A parsed service account JSON key.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PKCS#8 PEM private key.
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> KmsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> KmsResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + EXPIRY_SLACK_SECS < self.expires_at
    }
}

/// Exchanges a service account key for cached bearer tokens.
pub struct AccessTokenProvider {
    key: ServiceAccountKey,
    signing_key: SigningKey<Sha256>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> KmsResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(&key.private_key).map_err(|e| {
            KmsError::Authentication(format!("Invalid service account private key: {}", e))
        })?;

        Ok(Self {
            key,
            signing_key: SigningKey::<Sha256>::new(private_key),
            http,
            cached: Mutex::new(None),
        })
    }

    /// Get a valid access token, exchanging a fresh assertion if the
    /// cached one is missing or near expiry.
    pub async fn token(&self) -> KmsResult<String> {
        let now = Utc::now().timestamp();

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        debug!(client_email = %self.key.client_email, "Exchanging service account assertion for access token");

        let assertion = self.build_assertion(now)?;
        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KmsError::Authentication(format!(
                "Token endpoint error ({}): {}",
                status, error_text
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token.clone();

        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        });

        Ok(access_token)
    }

    /// Build the RS256 JWT assertion for the bearer grant.
    fn build_assertion(&self, iat: i64) -> KmsResult<String> {
        let header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CLOUDKMS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );

        let signature = self
            .signing_key
            .try_sign(signing_input.as_bytes())
            .map_err(|e| KmsError::Authentication(format!("Assertion signing failed: {}", e)))?;

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePrivateKey;
    use rsa::rand_core::OsRng;

    fn test_key() -> ServiceAccountKey {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let pem = private_key
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        ServiceAccountKey {
            client_email: "demo@test-project.iam.gserviceaccount.com".to_string(),
            private_key: pem.to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            project_id: Some("test-project".to_string()),
        }
    }

    #[test]
    fn test_assertion_structure() {
        let provider = AccessTokenProvider::new(test_key(), reqwest::Client::new()).unwrap();

        let assertion = provider.build_assertion(1_700_000_000).unwrap();
        let parts: Vec<&str> = assertion.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["typ"], "JWT");

        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(
            claims["iss"],
            "demo@test-project.iam.gserviceaccount.com"
        );
        assert_eq!(claims["scope"], CLOUDKMS_SCOPE);
        assert_eq!(claims["aud"], "https://oauth2.googleapis.com/token");
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            ASSERTION_LIFETIME_SECS
        );

        // Signature must be a valid 2048-bit RSA signature.
        assert_eq!(URL_SAFE_NO_PAD.decode(parts[2]).unwrap().len(), 256);
    }

    #[test]
    fn test_rejects_garbage_private_key() {
        let mut key = test_key();
        key.private_key = "not a pem".to_string();

        let result = AccessTokenProvider::new(key, reqwest::Client::new());
        assert!(matches!(result, Err(KmsError::Authentication(_))));
    }

    #[test]
    fn test_cached_token_freshness() {
        let token = CachedToken {
            access_token: "token".to_string(),
            expires_at: 1_000,
        };

        assert!(token.is_fresh(1_000 - EXPIRY_SLACK_SECS - 1));
        assert!(!token.is_fresh(1_000 - EXPIRY_SLACK_SECS));
        assert!(!token.is_fresh(2_000));
    }

    #[test]
    fn test_service_account_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{
                "client_email": "demo@test-project.iam.gserviceaccount.com",
                "private_key": "irrelevant here"
            }"#,
        )
        .unwrap();

        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(key.project_id.is_none());
    }
}
