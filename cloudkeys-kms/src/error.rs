//! Error types for the Cloud KMS client
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


use cloudkeys_types::{NameError, Status};
use thiserror::Error;

/// Cloud KMS client errors
#[derive(Error, Debug)]
pub enum KmsError {
    /// A Google RPC error decoded from the response body. `status` is the
    /// canonical string (`ALREADY_EXISTS`, `NOT_FOUND`, ...).
    #[error("KMS API error ({status}): {message}")]
    Api {
        code: i32,
        status: String,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Plaintext is {size} bytes, the KMS limit is {limit}")]
    PlaintextTooLarge { size: usize, limit: usize },

    #[error("Invalid resource name: {0}")]
    InvalidName(#[from] NameError),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KmsError {
    pub fn from_status(status: Status) -> Self {
        KmsError::Api {
            code: status.code,
            status: status.status,
            message: status.message,
        }
    }

    /// The one fault recovered locally: a create that raced an existing
    /// resource, answered by fetching it instead.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, KmsError::Api { status, .. } if status == "ALREADY_EXISTS")
    }
}

/// Result type for KMS operations
pub type KmsResult<T> = Result<T, KmsError>;
