//! Cloud KMS REST payload types
//!
//! Mirrors the JSON representation of the Cloud KMS v1 API: field names are
//! camelCase, enums are SCREAMING_SNAKE_CASE strings, bytes fields travel
//! base64-encoded, proto durations are `"{seconds}s"` strings and proto
//! timestamps are RFC 3339 strings.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a crypto key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyPurpose {
    CryptoKeyPurposeUnspecified,
    EncryptDecrypt,
    AsymmetricSign,
    AsymmetricDecrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionAlgorithm {
    CryptoKeyVersionAlgorithmUnspecified,
    GoogleSymmetricEncryption,
}

/// Lifecycle state of a crypto key version. Only `Enabled` versions can
/// serve encrypt and decrypt requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionState {
    CryptoKeyVersionStateUnspecified,
    PendingGeneration,
    Enabled,
    Disabled,
    Destroyed,
    DestroyScheduled,
}

/// A named container grouping related crypto keys within a location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeyVersionTemplate {
    pub algorithm: CryptoKeyVersionAlgorithm,
}

/// A logical key with a purpose and rotation policy, materialized as one
/// or more versions. `name`, `primary` and `create_time` are output-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<CryptoKeyPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_template: Option<CryptoKeyVersionTemplate>,
    /// Proto duration string, e.g. `"31536000s"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_rotation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<CryptoKeyVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

/// The concrete key material and state used for a single encrypt or
/// decrypt operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeyVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CryptoKeyVersionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptRequest {
    /// Base64-encoded plaintext.
    pub plaintext: String,
}

impl EncryptRequest {
    pub fn from_bytes(plaintext: &[u8]) -> Self {
        Self {
            plaintext: BASE64.encode(plaintext),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptResponse {
    /// Specifier of the crypto key version that produced the ciphertext.
    pub name: String,
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

impl EncryptResponse {
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.ciphertext)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptRequest {
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

impl DecryptRequest {
    pub fn from_bytes(ciphertext: &[u8]) -> Self {
        Self {
            ciphertext: BASE64.encode(ciphertext),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResponse {
    /// Base64-encoded recovered plaintext.
    pub plaintext: String,
}

impl DecryptResponse {
    pub fn plaintext_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.plaintext)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrimaryVersionRequest {
    pub crypto_key_version_id: String,
}

/// Google RPC error payload, `{"error": {code, message, status}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Format a duration as a proto JSON duration string.
pub fn proto_duration(duration: chrono::Duration) -> String {
    format!("{}s", duration.num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_representation() {
        let json = serde_json::to_string(&CryptoKeyVersionState::Disabled).unwrap();
        assert_eq!(json, "\"DISABLED\"");

        let state: CryptoKeyVersionState = serde_json::from_str("\"ENABLED\"").unwrap();
        assert_eq!(state, CryptoKeyVersionState::Enabled);
    }

    #[test]
    fn test_crypto_key_create_body_omits_output_fields() {
        let key = CryptoKey {
            purpose: Some(CryptoKeyPurpose::EncryptDecrypt),
            version_template: Some(CryptoKeyVersionTemplate {
                algorithm: CryptoKeyVersionAlgorithm::GoogleSymmetricEncryption,
            }),
            rotation_period: Some(proto_duration(chrono::Duration::days(365))),
            ..Default::default()
        };

        let body = serde_json::to_value(&key).unwrap();
        assert_eq!(body["purpose"], "ENCRYPT_DECRYPT");
        assert_eq!(body["versionTemplate"]["algorithm"], "GOOGLE_SYMMETRIC_ENCRYPTION");
        assert_eq!(body["rotationPeriod"], "31536000s");
        assert!(body.get("name").is_none());
        assert!(body.get("primary").is_none());
    }

    #[test]
    fn test_error_body_decoding() {
        let raw = r#"{"error":{"code":409,"message":"KeyRing already exists","status":"ALREADY_EXISTS"}}"#;
        let body: ErrorBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.error.code, 409);
        assert_eq!(body.error.status, "ALREADY_EXISTS");
    }

    #[test]
    fn test_encrypt_request_transport_encoding() {
        let request = EncryptRequest::from_bytes(b"I love pizza!");
        assert_eq!(request.plaintext, "SSBsb3ZlIHBpenphIQ==");
    }
}
