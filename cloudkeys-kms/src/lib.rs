//! Cloud KMS client for the Cloudkeys demo
//!
//! Thin pass-through to the Cloud KMS REST API: key ring and crypto key
//! creation, encrypt/decrypt, and version lifecycle (rotate, disable).
//! All key material and lifecycle state live in the remote service; this
//! crate only issues requests and reads responses. An in-memory backend
//! implementing the same API seam backs the integration tests.
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


pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod lifecycle;
pub mod memory;

pub use api::KeyManagementApi;
pub use auth::{AccessTokenProvider, ServiceAccountKey};
pub use client::{KmsClient, KmsClientConfig};
pub use error::{KmsError, KmsResult};
pub use lifecycle::{EncryptOutcome, KeyLifecycle};
pub use memory::InMemoryKms;
