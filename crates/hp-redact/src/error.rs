//! Error types for PHI classification.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while loading or compiling a PHI policy.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// The policy content is invalid.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// A path rule is not a valid field path.
    #[error("invalid path rule {rule:?}: {message}")]
    InvalidPath { rule: String, message: String },

    /// Failed to compile a regex pattern.
    #[error("pattern error: {0}")]
    PatternError(String),

    /// I/O error reading a policy file.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
