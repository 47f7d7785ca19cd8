//! Configuration validation errors and semantic validation.

use crate::ProfilerConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema table error: {0}")]
    SchemaError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 10,
            ValidationError::ParseError(_) => 11,
            ValidationError::SchemaError(_) => 12,
            ValidationError::InvalidValue { .. } => 13,
            ValidationError::VersionMismatch { .. } => 14,
        }
    }
}

/// Maximum explicit worker count.
pub const MAX_WORKERS: usize = 256;

/// Validate tunables before any partition begins.
pub fn validate_profiler_config(config: &ProfilerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.workers > MAX_WORKERS {
        return Err(ValidationError::InvalidValue {
            field: "workers".to_string(),
            message: format!("Must be in [0, {}], got {}", MAX_WORKERS, config.workers),
        });
    }

    if config.batch_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "batch_size".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if config.unique_value_cap == 0 {
        return Err(ValidationError::InvalidValue {
            field: "unique_value_cap".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    // NaN fails both comparisons
    let t = config.required_threshold;
    if !(t > 0.0 && t <= 1.0) {
        return Err(ValidationError::InvalidValue {
            field: "required_threshold".to_string(),
            message: format!("Must be in (0, 1], got {}", t),
        });
    }

    let r = config.rarity_threshold;
    if !(r > 0.0 && r < 1.0) {
        return Err(ValidationError::InvalidValue {
            field: "rarity_threshold".to_string(),
            message: format!("Must be in (0, 1), got {}", r),
        });
    }

    for code in &config.suppressed_value_types {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidValue {
                field: "suppressed_value_types".to_string(),
                message: format!("Not a data type code: {:?}", code),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        validate_profiler_config(&ProfilerConfig::default()).unwrap();
    }

    #[test]
    fn test_zero_cap_rejected() {
        let config = ProfilerConfig {
            unique_value_cap: 0,
            ..Default::default()
        };
        let err = validate_profiler_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { ref field, .. } if field == "unique_value_cap"
        ));
        assert_eq!(err.code(), 13);
    }

    #[test]
    fn test_threshold_bounds() {
        for (required, rarity, ok) in [
            (1.0, 0.2, true),
            (0.0, 0.2, false),
            (1.1, 0.2, false),
            (f64::NAN, 0.2, false),
            (0.95, 0.0, false),
            (0.95, 1.0, false),
            (0.95, 0.999, true),
        ] {
            let config = ProfilerConfig {
                required_threshold: required,
                rarity_threshold: rarity,
                ..Default::default()
            };
            assert_eq!(
                validate_profiler_config(&config).is_ok(),
                ok,
                "required={required} rarity={rarity}"
            );
        }
    }

    #[test]
    fn test_worker_and_batch_bounds() {
        let too_many = ProfilerConfig {
            workers: MAX_WORKERS + 1,
            ..Default::default()
        };
        assert!(validate_profiler_config(&too_many).is_err());

        let empty_batch = ProfilerConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(validate_profiler_config(&empty_batch).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let config = ProfilerConfig {
            schema_version: "0.9.0".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_profiler_config(&config),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_suppressed_type_code() {
        let config = ProfilerConfig {
            suppressed_value_types: vec!["T S".to_string()],
            ..Default::default()
        };
        assert!(validate_profiler_config(&config).is_err());
    }
}
