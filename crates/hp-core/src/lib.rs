//! HL7 v2 structural profiler.
//!
//! This library provides:
//! - A delimiter-aware decoder producing a recursive value tree
//! - Mergeable per-path field statistics with PHI-aware value collection
//! - Segment-sequence signatures and pattern generalization
//! - The specification builder over merged state
//! - Parallel and streaming partition coordination with checkpoints
//!
//! The binary entry point is in `main.rs`.

pub mod accumulate;
pub mod checkpoint;
pub mod context;
pub mod coordinator;
pub mod decode;
pub mod exit_codes;
pub mod input;
pub mod logging;
pub mod output;
pub mod sequence;
pub mod spec;

pub use accumulate::{AccumulateContext, FieldAccumulator};
pub use context::ProfilerContext;
pub use coordinator::{
    CancelToken, Checkpoint, CheckpointSink, Coordinator, PartitionState, RunOutcome,
};
pub use decode::{decode, Message};
pub use sequence::SequenceProfiler;
pub use spec::{SpecBuilder, Specification};
