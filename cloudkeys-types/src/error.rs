//! Error types for resource name handling

use thiserror::Error;

/// Resource name errors
#[derive(Error, Debug)]
pub enum NameError {
    #[error("Malformed resource name: {0}")]
    Malformed(String),

    #[error("Resource name {name} is not a {expected}")]
    WrongCollection { name: String, expected: &'static str },
}
