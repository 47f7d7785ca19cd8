//! HL7 profiler configuration loading and validation.
//!
//! This crate provides:
//! - Typed tunables (`ProfilerConfig`) for a profiling run
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation, fatal before any partition starts
//! - Static HL7 schema tables with a built-in v2 subset
//! - Config snapshots whose hash pins checkpoints to a configuration

mod builtin;
pub mod profiler;
pub mod resolve;
pub mod snapshot;
pub mod tables;
pub mod validate;

pub use profiler::{ProfilerConfig, RunMode};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use tables::{ComponentDef, DataTypeDef, FieldDef, SchemaTables};
pub use validate::{validate_profiler_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
