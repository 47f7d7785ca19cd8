//! Checkpoint writer.
//!
//! Creates ZIP archives with manifest and checksums, replacing any previous
//! checkpoint atomically.

use crate::{
    BundleError, CheckpointManifest, FileEntry, Result, MANIFEST_FILE_NAME, STATE_FILE_NAME,
};
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Builder for checkpoint bundles.
pub struct CheckpointWriter {
    manifest: CheckpointManifest,
    files: Vec<(String, Vec<u8>)>,
}

impl CheckpointWriter {
    pub fn new(
        run_id: impl Into<String>,
        config_hash: impl Into<String>,
        records_consumed: u64,
    ) -> Self {
        Self {
            manifest: CheckpointManifest::new(run_id, config_hash, records_consumed),
            files: Vec::new(),
        }
    }

    pub fn with_batches_completed(mut self, batches: u64) -> Self {
        self.manifest.batches_completed = batches;
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.manifest.tool_version = Some(version.into());
        self
    }

    /// Add a file to the bundle with automatic checksum.
    pub fn add_file(&mut self, path: impl Into<String>, data: Vec<u8>) {
        let path = path.into();
        let checksum = FileEntry::compute_checksum(&data);
        let bytes = data.len() as u64;
        debug!(path = %path, bytes, "Added file to checkpoint");
        self.manifest.add_file(FileEntry::new(&path, checksum, bytes));
        self.files.push((path, data));
    }

    /// Add a JSON-serializable value as a file.
    pub fn add_json<T: serde::Serialize>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        self.add_file(path, json);
        Ok(())
    }

    /// Add the partition state.
    pub fn add_state<T: serde::Serialize>(&mut self, state: &T) -> Result<()> {
        self.add_json(STATE_FILE_NAME, state)
    }

    pub fn manifest(&self) -> &CheckpointManifest {
        &self.manifest
    }

    /// Get total size in bytes before compression.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|(_, data)| data.len() as u64).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Write the checkpoint to `path`, replacing any existing one.
    ///
    /// The archive is written to a sibling temporary file first and renamed
    /// into place.
    pub fn write(mut self, path: &Path) -> Result<CheckpointManifest> {
        self.prepare()?;

        let tmp = temp_path(path);
        let result = (|| -> Result<()> {
            let file = File::create(&tmp)?;
            let file = self.write_zip(file)?;
            file.sync_all()?;
            std::fs::rename(&tmp, path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result?;

        info!(
            path = %path.display(),
            records_consumed = self.manifest.records_consumed,
            bytes = self.total_bytes(),
            "Checkpoint written"
        );

        Ok(self.manifest)
    }

    /// Write the checkpoint to a byte vector (for in-memory use).
    pub fn write_to_vec(mut self) -> Result<(Vec<u8>, CheckpointManifest)> {
        self.prepare()?;
        let buffer = self.write_zip(Cursor::new(Vec::new()))?;
        let bytes = buffer.into_inner();
        debug!(compressed_bytes = bytes.len(), "Checkpoint written to memory");
        Ok((bytes, self.manifest))
    }

    fn prepare(&mut self) -> Result<()> {
        if self.files.is_empty() {
            return Err(BundleError::EmptyBundle);
        }
        // Sort files for deterministic ordering
        self.manifest.sort_files();
        self.files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(())
    }

    fn write_zip<W: Write + Seek>(&self, sink: W) -> Result<W> {
        let manifest_json = self.manifest.to_json()?;

        let mut zip = ZipWriter::new(sink);
        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o600);

        // Manifest first
        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(manifest_json.as_bytes())?;

        for (file_path, data) in &self.files {
            zip.start_file(file_path.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "checkpoint".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writer_add_state() {
        let mut writer = CheckpointWriter::new("run-1", "hash", 10);
        writer.add_state(&serde_json::json!({"n": 1})).unwrap();
        assert_eq!(writer.file_count(), 1);
        assert!(writer.manifest().find_file(STATE_FILE_NAME).is_some());
    }

    #[test]
    fn test_write_empty_fails() {
        let writer = CheckpointWriter::new("run-1", "hash", 0);
        assert!(matches!(writer.write_to_vec(), Err(BundleError::EmptyBundle)));
    }

    #[test]
    fn test_write_to_vec_is_zip() {
        let mut writer = CheckpointWriter::new("run-1", "hash", 0);
        writer.add_file("state.json", b"{}".to_vec());
        let (bytes, manifest) = writer.write_to_vec().unwrap();
        assert_eq!(&bytes[0..2], b"PK");
        assert_eq!(manifest.file_count(), 1);
    }

    #[test]
    fn test_write_replaces_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.hpc");
        std::fs::write(&path, b"old").unwrap();

        let mut writer = CheckpointWriter::new("run-1", "hash", 3).with_batches_completed(1);
        writer.add_state(&serde_json::json!([1, 2, 3])).unwrap();
        let manifest = writer.write(&path).unwrap();

        assert_eq!(manifest.batches_completed, 1);
        assert_ne!(std::fs::read(&path).unwrap(), b"old");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let p = Path::new("/a/b/run.hpc");
        assert_eq!(temp_path(p), Path::new("/a/b/run.hpc.tmp"));
    }
}
