//! Stable event names and pipeline stages.
//!
//! Every structured log record carries an `event` field from
//! [`event_names`] and a `stage` field from [`Stage`], so JSONL consumers can
//! filter without matching on message text.

use serde::{Deserialize, Serialize};

/// Processing stages of a profiling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration loading.
    Init,
    /// Input file discovery.
    Discover,
    /// Record decoding.
    Decode,
    /// Statistics accumulation within a partition.
    Aggregate,
    /// Partition reduction.
    Merge,
    /// Specification building.
    Build,
    /// Output and checkpoint writing.
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Discover => "discover",
            Stage::Decode => "decode",
            Stage::Aggregate => "aggregate",
            Stage::Merge => "merge",
            Stage::Build => "build",
            Stage::Write => "write",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_INTERRUPTED: &str = "run.interrupted";

    // Configuration
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_INVALID: &str = "config.invalid";

    // Input
    pub const INPUT_DISCOVERED: &str = "input.discovered";
    pub const INPUT_FAILED: &str = "input.failed";

    // Per-record
    pub const DECODE_FAILED: &str = "decode.failed";
    pub const SCHEMA_GAP: &str = "schema.gap";

    // Partitions
    pub const PARTITION_FINISHED: &str = "partition.finished";
    pub const BATCH_FINISHED: &str = "batch.finished";
    pub const MERGE_FINISHED: &str = "merge.finished";

    // Output
    pub const SPEC_BUILT: &str = "spec.built";
    pub const MESSAGE_TYPE_OMITTED: &str = "spec.type_omitted";
    pub const CHECKPOINT_WRITTEN: &str = "checkpoint.written";
    pub const CHECKPOINT_RESUMED: &str = "checkpoint.resumed";
    pub const OUTPUT_WRITTEN: &str = "output.written";
}
