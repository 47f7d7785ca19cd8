//! Error types for checkpoint operations.

use thiserror::Error;

/// Errors that can occur during checkpoint operations.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checksum verification failed
    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Missing required file in bundle
    #[error("missing required file: {0}")]
    MissingFile(String),

    /// Unknown or unsupported bundle version
    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Corrupted manifest
    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// File not listed in the manifest
    #[error("file not found in bundle: {0}")]
    FileNotFound(String),

    /// Bundle is empty
    #[error("checkpoint has no content to write")]
    EmptyBundle,

    /// Checkpoint was produced under a different configuration
    #[error("checkpoint configuration mismatch: expected {expected}, got {actual}")]
    ConfigMismatch { expected: String, actual: String },
}

/// Result type alias for checkpoint operations.
pub type Result<T> = std::result::Result<T, BundleError>;
