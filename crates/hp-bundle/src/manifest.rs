//! Checkpoint manifest types and serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current bundle schema version.
pub const BUNDLE_SCHEMA_VERSION: &str = "1.0.0";

/// Checkpoint manifest containing run position and file checksums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointManifest {
    /// Bundle format version.
    pub bundle_version: String,

    /// When the checkpoint was written.
    pub created_at: DateTime<Utc>,

    /// Run that wrote this checkpoint.
    pub run_id: String,

    /// Combined configuration hash the state was produced under.
    pub config_hash: String,

    /// Input records fully folded into the saved state.
    pub records_consumed: u64,

    /// Streaming batches completed.
    #[serde(default)]
    pub batches_completed: u64,

    /// Files included in the bundle with checksums.
    pub files: Vec<FileEntry>,

    /// Profiler version that wrote this checkpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
}

impl CheckpointManifest {
    pub fn new(
        run_id: impl Into<String>,
        config_hash: impl Into<String>,
        records_consumed: u64,
    ) -> Self {
        Self {
            bundle_version: BUNDLE_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            run_id: run_id.into(),
            config_hash: config_hash.into(),
            records_consumed,
            batches_completed: 0,
            files: Vec::new(),
            tool_version: None,
        }
    }

    /// Add a file entry to the manifest.
    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    /// Get total size of all files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Find a file by path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> crate::Result<()> {
        if self.bundle_version != BUNDLE_SCHEMA_VERSION {
            return Err(crate::BundleError::UnsupportedVersion {
                version: self.bundle_version.clone(),
                supported: BUNDLE_SCHEMA_VERSION.to_string(),
            });
        }

        if self.run_id.is_empty() {
            return Err(crate::BundleError::CorruptedManifest(
                "run_id is empty".to_string(),
            ));
        }

        if self.config_hash.is_empty() {
            return Err(crate::BundleError::CorruptedManifest(
                "config_hash is empty".to_string(),
            ));
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(crate::BundleError::CorruptedManifest(
                    "file entry has empty path".to_string(),
                ));
            }
            if file.sha256.len() != 64 {
                return Err(crate::BundleError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum length",
                    file.path
                )));
            }
        }

        Ok(())
    }

    /// Sort files for deterministic ordering.
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path within the bundle (relative).
    pub path: String,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,

    /// Size in bytes.
    pub bytes: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, sha256: impl Into<String>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
            bytes,
        }
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_new() {
        let manifest = CheckpointManifest::new("run-1", "abc", 500);
        assert_eq!(manifest.run_id, "run-1");
        assert_eq!(manifest.records_consumed, 500);
        assert_eq!(manifest.bundle_version, BUNDLE_SCHEMA_VERSION);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_manifest_validate_empty_fields() {
        assert!(CheckpointManifest::new("", "abc", 0).validate().is_err());
        assert!(CheckpointManifest::new("run-1", "", 0).validate().is_err());
    }

    #[test]
    fn test_manifest_validate_invalid_checksum() {
        let mut manifest = CheckpointManifest::new("run-1", "abc", 0);
        manifest.add_file(FileEntry::new("state.json", "invalid", 100));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_manifest_sort_and_find() {
        let mut manifest = CheckpointManifest::new("run-1", "abc", 0);
        manifest.add_file(FileEntry::new("z.json", "a".repeat(64), 10));
        manifest.add_file(FileEntry::new("a.json", "b".repeat(64), 20));
        manifest.sort_files();
        assert_eq!(manifest.files[0].path, "a.json");
        assert_eq!(manifest.total_bytes(), 30);
        assert!(manifest.find_file("z.json").is_some());
        assert!(manifest.find_file("m.json").is_none());
    }

    #[test]
    fn test_file_entry_checksum() {
        let data = b"hello";
        let entry = FileEntry::new("x", FileEntry::compute_checksum(data), 5);
        assert!(entry.verify(data));
        assert!(!entry.verify(b"hellp"));
        assert_eq!(entry.sha256.len(), 64);
    }
}
