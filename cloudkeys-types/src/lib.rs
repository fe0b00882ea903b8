//! Cloudkeys Types
//!
//! Shared type definitions for Cloud KMS resource names and the REST
//! payloads exchanged with the service, used across all Cloudkeys crates.

pub mod error;
pub mod names;
pub mod resources;

pub use error::*;
pub use names::*;
pub use resources::*;
