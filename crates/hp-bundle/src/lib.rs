//! Checkpoint bundles for resumable HL7 profiling runs.
//!
//! A streaming run periodically persists its merged partition state so an
//! interrupted run can continue where it stopped. A checkpoint is a ZIP
//! archive containing:
//! - `manifest.json`: run id, configuration hash, records consumed, and a
//!   file listing with SHA-256 checksums
//! - `state.json`: the serialized partition state
//!
//! Checkpoints are written to a sibling temporary file and renamed into
//! place, so a crash mid-write leaves the previous checkpoint intact.
//!
//! # Example
//!
//! ```no_run
//! use hp_bundle::{CheckpointReader, CheckpointWriter};
//! use std::path::Path;
//!
//! let mut writer = CheckpointWriter::new("run-0123456789ab", "cfg-hash", 1000);
//! writer.add_state(&serde_json::json!({"messages": 1000})).unwrap();
//! writer.write(Path::new("run.hpc")).unwrap();
//!
//! let mut reader = CheckpointReader::open(Path::new("run.hpc")).unwrap();
//! reader.expect_config_hash("cfg-hash").unwrap();
//! let state: serde_json::Value = reader.read_state().unwrap();
//! ```

pub mod error;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use error::{BundleError, Result};
pub use manifest::{CheckpointManifest, FileEntry, BUNDLE_SCHEMA_VERSION};
pub use reader::CheckpointReader;
pub use writer::CheckpointWriter;

/// Manifest file name within the bundle.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Partition state file name within the bundle.
pub const STATE_FILE_NAME: &str = "state.json";
