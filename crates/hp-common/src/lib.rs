//! HL7 profiler common types, identifiers, and errors.
//!
//! This crate provides foundational types shared across the hp-* crates:
//! - `FieldPath` / `SegmentCode`: the stable key of every statistic bucket
//! - Run identifiers
//! - The error taxonomy with stable codes
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;
pub mod path;
pub mod schema;

pub use error::{
    DecodeError, DecodeErrorKind, Error, ErrorCategory, MergeInvariantViolation, Result,
    SchemaGapWarning,
};
pub use id::RunId;
pub use output::OutputFormat;
pub use path::{FieldPath, PathParseError, SegmentCode};
pub use schema::SPEC_SCHEMA_VERSION;
