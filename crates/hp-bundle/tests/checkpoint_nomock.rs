//! Checkpoint write/read/verify against the real filesystem.

use hp_bundle::{BundleError, CheckpointReader, CheckpointWriter, STATE_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::TempDir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct FakeState {
    messages: u64,
    counts: BTreeMap<String, u64>,
}

fn state() -> FakeState {
    let mut counts = BTreeMap::new();
    counts.insert("PID.5".to_string(), 7);
    counts.insert("MSH.9".to_string(), 9);
    FakeState { messages: 9, counts }
}

#[test]
fn test_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.hpc");

    let mut writer = CheckpointWriter::new("run-000000000001", "cfg-1", 9)
        .with_batches_completed(3)
        .with_tool_version("0.1.0");
    writer.add_state(&state()).unwrap();
    writer.write(&path).unwrap();

    let mut reader = CheckpointReader::open(&path).unwrap();
    reader.expect_config_hash("cfg-1").unwrap();
    assert_eq!(reader.manifest().batches_completed, 3);
    assert_eq!(reader.manifest().tool_version.as_deref(), Some("0.1.0"));
    let loaded: FakeState = reader.read_state().unwrap();
    assert_eq!(loaded, state());
}

#[test]
fn test_second_write_replaces_first() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.hpc");

    for consumed in [10, 20] {
        let mut writer = CheckpointWriter::new("run-000000000001", "cfg-1", consumed);
        writer.add_state(&state()).unwrap();
        writer.write(&path).unwrap();
    }

    let reader = CheckpointReader::open(&path).unwrap();
    assert_eq!(reader.records_consumed(), 20);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_tampered_state_fails_verification() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.hpc");
    let mut writer = CheckpointWriter::new("run-000000000001", "cfg-1", 9);
    writer.add_state(&state()).unwrap();
    let manifest = writer.write(&good).unwrap();

    // Rebuild the archive with the original manifest but altered state bytes.
    let bad = dir.path().join("bad.hpc");
    {
        let file = std::fs::File::create(&bad).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions<'_, ()> = zip::write::FileOptions::default();
        zip.start_file("manifest.json", options).unwrap();
        zip.write_all(manifest.to_json().unwrap().as_bytes()).unwrap();
        zip.start_file(STATE_FILE_NAME, options).unwrap();
        zip.write_all(br#"{"messages":1,"counts":{}}"#).unwrap();
        zip.finish().unwrap();
    }

    let mut reader = CheckpointReader::open(&bad).unwrap();
    let err = reader.read_state::<FakeState>().unwrap_err();
    assert!(matches!(err, BundleError::ChecksumMismatch { .. }));
    assert_eq!(reader.verify_all(), vec![STATE_FILE_NAME.to_string()]);
}

#[test]
fn test_missing_checkpoint_file() {
    let dir = TempDir::new().unwrap();
    let result = CheckpointReader::open(&dir.path().join("absent.hpc"));
    assert!(matches!(result, Err(BundleError::Io(_))));
}
