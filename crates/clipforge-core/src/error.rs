//! Error types for clipforge.

use thiserror::Error;

/// Main error type for clipforge operations.
#[derive(Error, Debug)]
pub enum ClipforgeError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for clipforge operations.
pub type Result<T> = std::result::Result<T, ClipforgeError>;
