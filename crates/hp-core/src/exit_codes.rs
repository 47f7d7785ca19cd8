//! Exit codes for the hl7-profiler CLI.
//!
//! Exit code ranges:
//! - 0-2: Operational outcomes (a specification was or could be written)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use hp_common::{Error, ErrorCategory};

/// Exit codes for hl7-profiler operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-2)
    // ========================================================================
    /// Every record decoded and every input file was read
    Clean = 0,

    /// Specification written, but some records or files were skipped
    PartialDecode = 1,

    /// Run interrupted; partial state checkpointed where enabled
    Interrupted = 2,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Invalid tunables, schema tables or PHI policy
    ConfigError = 11,

    /// Input path missing or unreadable
    InputError = 12,

    /// No record decoded
    NoData = 13,

    /// Checkpoint unreadable or written under another configuration
    CheckpointError = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates a written specification.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::PartialDecode)
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialDecode => "OK_PARTIAL",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::NoData => "ERR_NO_DATA",
            ExitCode::CheckpointError => "ERR_CHECKPOINT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::NoData { .. } => ExitCode::NoData,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
            _ => match error.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Input => ExitCode::InputError,
                ErrorCategory::Checkpoint => ExitCode::CheckpointError,
                _ => ExitCode::InternalError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_common::{DecodeError, DecodeErrorKind};

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::PartialDecode.as_i32(), 1);
        assert_eq!(ExitCode::Interrupted.as_i32(), 2);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::NoData.as_i32(), 13);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
    }

    #[test]
    fn test_exit_code_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::PartialDecode.is_success());
        assert!(!ExitCode::Interrupted.is_success());
        assert!(!ExitCode::Interrupted.is_error());
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::CheckpointError.is_internal_error());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::from(&Error::Config("bad".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from(&Error::NoData { decode_errors: 2 }),
            ExitCode::NoData
        );
        assert_eq!(
            ExitCode::from(&Error::CheckpointMismatch {
                expected: "a".into(),
                actual: "b".into()
            }),
            ExitCode::CheckpointError
        );
        assert_eq!(
            ExitCode::from(&Error::Decode(DecodeError::new(DecodeErrorKind::Empty, "x"))),
            ExitCode::InternalError
        );
        assert_eq!(
            ExitCode::from(&Error::WorkerPanicked { partition: 1 }),
            ExitCode::InternalError
        );
    }

    #[test]
    fn test_display_includes_name_and_code() {
        assert_eq!(ExitCode::NoData.to_string(), "ERR_NO_DATA (13)");
    }
}
