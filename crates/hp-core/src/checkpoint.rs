//! Checkpoint persistence for streaming runs, backed by `hp-bundle`.

use crate::coordinator::{Checkpoint, CheckpointSink, PartitionState};
use crate::logging::{event_names, Stage};
use hp_bundle::{BundleError, CheckpointReader, CheckpointWriter};
use hp_common::{Error, Result};
use std::path::{Path, PathBuf};

fn bundle_error(err: BundleError) -> Error {
    match err {
        BundleError::ConfigMismatch { expected, actual } => {
            Error::CheckpointMismatch { expected, actual }
        }
        other => Error::Checkpoint(other.to_string()),
    }
}

/// Writes the running state to one bundle file, replacing it each batch.
pub struct BundleCheckpoint {
    path: PathBuf,
    run_id: String,
    config_hash: String,
}

impl BundleCheckpoint {
    pub fn new(
        path: impl Into<PathBuf>,
        run_id: impl Into<String>,
        config_hash: impl Into<String>,
    ) -> Self {
        BundleCheckpoint {
            path: path.into(),
            run_id: run_id.into(),
            config_hash: config_hash.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSink for BundleCheckpoint {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        let mut writer = CheckpointWriter::new(
            self.run_id.as_str(),
            self.config_hash.as_str(),
            checkpoint.records_consumed,
        )
        .with_batches_completed(checkpoint.batches_completed)
        .with_tool_version(env!("CARGO_PKG_VERSION"));
        writer.add_state(&checkpoint.state).map_err(bundle_error)?;
        writer.write(&self.path).map_err(bundle_error)?;
        tracing::debug!(
            event = event_names::CHECKPOINT_WRITTEN,
            stage = %Stage::Aggregate,
            path = %self.path.display(),
            records_consumed = checkpoint.records_consumed,
            "checkpoint written"
        );
        Ok(())
    }
}

/// Open a checkpoint and check it was written under `expected_hash`.
pub fn load_checkpoint(path: &Path, expected_hash: &str) -> Result<Checkpoint> {
    let mut reader = CheckpointReader::open(path).map_err(bundle_error)?;
    reader.expect_config_hash(expected_hash).map_err(bundle_error)?;
    let state: PartitionState = reader.read_state().map_err(bundle_error)?;
    let checkpoint = Checkpoint {
        records_consumed: reader.records_consumed(),
        batches_completed: reader.manifest().batches_completed,
        state,
    };
    if checkpoint.state.counters.records != checkpoint.records_consumed {
        return Err(Error::Checkpoint(format!(
            "state holds {} records but manifest claims {}",
            checkpoint.state.counters.records, checkpoint.records_consumed
        )));
    }
    tracing::info!(
        event = event_names::CHECKPOINT_RESUMED,
        stage = %Stage::Init,
        path = %path.display(),
        records_consumed = checkpoint.records_consumed,
        "resuming from checkpoint"
    );
    Ok(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::AccumulateContext;
    use crate::input::Record;
    use hp_config::SchemaTables;
    use hp_redact::{PhiClassifier, PhiPolicy};
    use tempfile::tempdir;

    fn sample_state() -> PartitionState {
        let tables = SchemaTables::builtin();
        let phi = PhiClassifier::new(&PhiPolicy::default()).unwrap();
        let ctx = AccumulateContext {
            tables: &tables,
            phi: &phi,
            unique_value_cap: 10,
        };
        let mut state = PartitionState::new();
        state.ingest(
            &Record::in_memory(0, "MSH|^~\\&|||||||ORU^R01\rPID|1||7^^^MRN\rOBX|1|NM|GLU||5.4"),
            &ctx,
        );
        state.ingest(&Record::in_memory(1, "not hl7"), &ctx);
        state
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.hpc");
        let state = sample_state();
        let mut sink = BundleCheckpoint::new(&path, "run-0123456789ab", "cfg-1");
        let saved = Checkpoint {
            records_consumed: 2,
            batches_completed: 1,
            state,
        };
        sink.save(&saved).unwrap();

        let loaded = load_checkpoint(&path, "cfg-1").unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_config_mismatch_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.hpc");
        let mut sink = BundleCheckpoint::new(&path, "run-0123456789ab", "cfg-1");
        sink.save(&Checkpoint {
            records_consumed: 2,
            batches_completed: 1,
            state: sample_state(),
        })
        .unwrap();

        let err = load_checkpoint(&path, "cfg-2").unwrap_err();
        assert!(matches!(err, Error::CheckpointMismatch { .. }));
    }

    #[test]
    fn test_inconsistent_manifest_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.hpc");
        let mut sink = BundleCheckpoint::new(&path, "run-0123456789ab", "cfg-1");
        sink.save(&Checkpoint {
            records_consumed: 9,
            batches_completed: 1,
            state: sample_state(),
        })
        .unwrap();
        assert!(matches!(
            load_checkpoint(&path, "cfg-1"),
            Err(Error::Checkpoint(_))
        ));
    }

    #[test]
    fn test_missing_file_is_checkpoint_error() {
        let dir = tempdir().unwrap();
        let err = load_checkpoint(&dir.path().join("absent.hpc"), "cfg").unwrap_err();
        assert!(matches!(err, Error::Checkpoint(_)));
    }
}
