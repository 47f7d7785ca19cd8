//! Error types for the HL7 profiler.
//!
//! The taxonomy separates per-record problems from run-level failures:
//! - [`DecodeError`]: one record could not be decoded. Skipped and counted,
//!   never fatal.
//! - [`SchemaGapWarning`]: a field position missing from the static schema.
//!   Recorded under its own bucket, never fatal.
//! - Configuration errors: fatal before any partition begins.
//! - [`MergeInvariantViolation`]: an internal statistics invariant failed.
//!   Checked in debug builds and tests; never expected in correct code.
//!
//! Every [`Error`] variant carries a stable code, grouped by category:
//! ```json
//! { "code": 30, "category": "decode", "message": "...", "recoverable": true }
//! ```

use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for profiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration, schema-table and PHI-policy errors.
    Config,
    /// Input discovery and reading errors.
    Input,
    /// Record decoding errors.
    Decode,
    /// Statistics merge invariants.
    Merge,
    /// Specification building.
    Build,
    /// Checkpoint persistence.
    Checkpoint,
    /// Output writing and serialization.
    Output,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Decode => write!(f, "decode"),
            ErrorCategory::Merge => write!(f, "merge"),
            ErrorCategory::Build => write!(f, "build"),
            ErrorCategory::Checkpoint => write!(f, "checkpoint"),
            ErrorCategory::Output => write!(f, "output"),
        }
    }
}

/// Why a record failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    /// Record is empty or whitespace only.
    Empty,
    /// First segment is not an `MSH` header.
    MissingHeader,
    /// Header too short to carry the field separator and encoding characters.
    TruncatedHeader,
    /// Encoding characters field is missing or malformed.
    InvalidEncodingCharacters,
    /// Two delimiters share a character, or a delimiter is alphanumeric.
    DelimiterConflict,
}

impl DecodeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeErrorKind::Empty => "empty",
            DecodeErrorKind::MissingHeader => "missing_header",
            DecodeErrorKind::TruncatedHeader => "truncated_header",
            DecodeErrorKind::InvalidEncodingCharacters => "invalid_encoding_characters",
            DecodeErrorKind::DelimiterConflict => "delimiter_conflict",
        }
    }
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that could not be decoded.
///
/// The detail never contains record content beyond delimiter characters or
/// segment codes, so it is safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub detail: String,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, detail: impl Into<String>) -> Self {
        DecodeError {
            kind,
            detail: detail.into(),
        }
    }
}

/// A field position that the static schema does not describe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaGapWarning {
    pub path: FieldPath,
}

impl std::fmt::Display for SchemaGapWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field {} is not in the schema tables", self.path)
    }
}

/// A statistics invariant that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("merge invariant violated at {path}: {detail}")]
pub struct MergeInvariantViolation {
    pub path: String,
    pub detail: String,
}

impl MergeInvariantViolation {
    pub fn new(path: impl Into<String>, detail: impl Into<String>) -> Self {
        MergeInvariantViolation {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Unified error type for the profiler.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid schema tables: {0}")]
    InvalidSchema(String),

    #[error("invalid PHI policy: {0}")]
    InvalidPhiPolicy(String),

    // Input errors (20-29)
    #[error("input not found: {path}")]
    InputNotFound { path: String },

    #[error("failed to read {path}: {message}")]
    InputRead { path: String, message: String },

    // Decode errors (30-39)
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    // Merge errors (40-49)
    #[error(transparent)]
    MergeInvariant(#[from] MergeInvariantViolation),

    #[error("partition {partition} worker panicked")]
    WorkerPanicked { partition: usize },

    // Build errors (50-59)
    #[error("no data: none of the input records decoded ({decode_errors} decode errors)")]
    NoData { decode_errors: u64 },

    // Checkpoint errors (60-69)
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("checkpoint was written under a different configuration (expected {expected}, found {actual})")]
    CheckpointMismatch { expected: String, actual: String },

    // Output errors (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Decode errors
    /// - 40-49: Merge invariants
    /// - 50-59: Build errors
    /// - 60-69: Checkpoint errors
    /// - 70-79: Output errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidSchema(_) => 11,
            Error::InvalidPhiPolicy(_) => 12,
            Error::InputNotFound { .. } => 20,
            Error::InputRead { .. } => 21,
            Error::Decode(_) => 30,
            Error::MergeInvariant(_) => 40,
            Error::WorkerPanicked { .. } => 41,
            Error::NoData { .. } => 50,
            Error::Checkpoint(_) => 60,
            Error::CheckpointMismatch { .. } => 61,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidSchema(_) | Error::InvalidPhiPolicy(_) => {
                ErrorCategory::Config
            }
            Error::InputNotFound { .. } | Error::InputRead { .. } => ErrorCategory::Input,
            Error::Decode(_) => ErrorCategory::Decode,
            Error::MergeInvariant(_) | Error::WorkerPanicked { .. } => ErrorCategory::Merge,
            Error::NoData { .. } => ErrorCategory::Build,
            Error::Checkpoint(_) | Error::CheckpointMismatch { .. } => ErrorCategory::Checkpoint,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Output,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidSchema(_) | Error::InvalidPhiPolicy(_) => true,
            Error::InputNotFound { .. } => true,
            Error::InputRead { .. } => true,
            // The run skips the record and continues.
            Error::Decode(_) => true,
            // A bug; rerunning will not help.
            Error::MergeInvariant(_) => false,
            Error::WorkerPanicked { .. } => false,
            Error::NoData { .. } => true,
            Error::Checkpoint(_) => true,
            Error::CheckpointMismatch { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'hl7-profiler check' to validate the configuration",
            Error::InvalidSchema(_) => "Check the JSON files in the schema directory",
            Error::InvalidPhiPolicy(_) => "Check the PHI policy file",
            Error::InputNotFound { .. } => "Verify the input path exists",
            Error::InputRead { .. } => "Check file permissions",
            Error::Decode(_) => "The record was skipped; inspect it with 'hl7-profiler decode'",
            Error::MergeInvariant(_) => "Please report this as a bug",
            Error::WorkerPanicked { .. } => "Please report this as a bug",
            Error::NoData { .. } => "Verify the input contains HL7 v2 messages starting with MSH",
            Error::Checkpoint(_) => "Delete the checkpoint file and start a fresh run",
            Error::CheckpointMismatch { .. } => {
                "Resume with the original configuration or start a fresh run"
            }
            Error::Io(_) => "Check disk space and permissions",
            Error::Json(_) => "Please report this as a bug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_match_categories() {
        let cases: Vec<(Error, ErrorCategory)> = vec![
            (Error::Config("x".into()), ErrorCategory::Config),
            (
                Error::InputNotFound {
                    path: "/nope".into(),
                },
                ErrorCategory::Input,
            ),
            (
                Error::Decode(DecodeError::new(DecodeErrorKind::Empty, "empty record")),
                ErrorCategory::Decode,
            ),
            (
                Error::MergeInvariant(MergeInvariantViolation::new("PID.5", "cap exceeded")),
                ErrorCategory::Merge,
            ),
            (Error::NoData { decode_errors: 3 }, ErrorCategory::Build),
            (Error::Checkpoint("bad".into()), ErrorCategory::Checkpoint),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category, "{}", err);
            let bucket = match category {
                ErrorCategory::Config => 10,
                ErrorCategory::Input => 20,
                ErrorCategory::Decode => 30,
                ErrorCategory::Merge => 40,
                ErrorCategory::Build => 50,
                ErrorCategory::Checkpoint => 60,
                ErrorCategory::Output => 70,
            };
            assert_eq!(err.code() / 10 * 10, bucket);
        }
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::new(DecodeErrorKind::MissingHeader, "first segment is PID");
        assert_eq!(err.to_string(), "missing_header: first segment is PID");
    }

    #[test]
    fn test_merge_invariant_not_recoverable() {
        let err: Error = MergeInvariantViolation::new("OBX.5", "presence > messages").into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("OBX.5"));
    }
}
