//! Profiler tunables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;

/// Upper bound for the automatic worker count.
const AUTO_WORKER_CAP: usize = 8;

/// How input records are partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Round-robin over independent worker threads.
    #[default]
    Parallel,
    /// Sequential fixed-size batches on one thread.
    Streaming,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Parallel => write!(f, "parallel"),
            RunMode::Streaming => write!(f, "streaming"),
        }
    }
}

/// Tunables for one profiling run. Every field has a default, so a partial
/// `profiler.json` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub schema_version: String,

    pub mode: RunMode,

    /// Worker threads in parallel mode; 0 picks available parallelism.
    pub workers: usize,

    /// Records per batch in streaming mode.
    pub batch_size: usize,

    /// Distinct values kept per field path.
    pub unique_value_cap: usize,

    /// Presence fraction at or above which a field is required.
    pub required_threshold: f64,

    /// Relative frequency below which a differing segment may be folded
    /// into a pattern as optional.
    pub rarity_threshold: f64,

    /// Declared data types whose values are collected but not reported.
    pub suppressed_value_types: Vec<String>,

    /// Only build the combined specification.
    pub combined_only: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            mode: RunMode::Parallel,
            workers: 0,
            batch_size: 1000,
            unique_value_cap: 100,
            required_threshold: 0.95,
            rarity_threshold: 0.2,
            suppressed_value_types: vec!["TS".to_string(), "DTM".to_string(), "SI".to_string()],
            combined_only: false,
        }
    }
}

impl ProfilerConfig {
    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_json(&content)
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Worker count to actually spawn.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(AUTO_WORKER_CAP)
    }

    /// Whether values of `data_type` are withheld from the specification.
    pub fn suppresses_type(&self, data_type: &str) -> bool {
        self.suppressed_value_types.iter().any(|t| t == data_type)
    }
}
