//! Checkpoint reader with integrity verification.

use crate::{
    BundleError, CheckpointManifest, FileEntry, Result, BUNDLE_SCHEMA_VERSION, MANIFEST_FILE_NAME,
    STATE_FILE_NAME,
};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Reader for checkpoint bundles.
pub struct CheckpointReader<R: Read + Seek> {
    manifest: CheckpointManifest,
    archive: ZipArchive<R>,
}

impl CheckpointReader<File> {
    /// Open a checkpoint from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl CheckpointReader<Cursor<Vec<u8>>> {
    /// Open a checkpoint from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> CheckpointReader<R> {
    /// Create a reader from any Read + Seek source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let manifest = Self::read_manifest(&mut archive)?;
        manifest.validate()?;

        info!(
            run_id = %manifest.run_id,
            records_consumed = manifest.records_consumed,
            "Checkpoint opened"
        );

        Ok(Self { manifest, archive })
    }

    fn read_manifest(archive: &mut ZipArchive<R>) -> Result<CheckpointManifest> {
        let mut manifest_file = archive
            .by_name(MANIFEST_FILE_NAME)
            .map_err(|_| BundleError::MissingFile(MANIFEST_FILE_NAME.to_string()))?;

        let mut json = String::new();
        manifest_file.read_to_string(&mut json)?;
        let manifest = CheckpointManifest::from_json(&json)?;

        if manifest.bundle_version != BUNDLE_SCHEMA_VERSION {
            warn!(
                bundle_version = %manifest.bundle_version,
                supported = BUNDLE_SCHEMA_VERSION,
                "Checkpoint version differs"
            );
        }
        Ok(manifest)
    }

    pub fn manifest(&self) -> &CheckpointManifest {
        &self.manifest
    }

    pub fn records_consumed(&self) -> u64 {
        self.manifest.records_consumed
    }

    /// Refuse checkpoints written under a different configuration.
    pub fn expect_config_hash(&self, expected: &str) -> Result<()> {
        if self.manifest.config_hash != expected {
            return Err(BundleError::ConfigMismatch {
                expected: expected.to_string(),
                actual: self.manifest.config_hash.clone(),
            });
        }
        Ok(())
    }

    /// Read a file without checksum verification.
    pub fn read_raw(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|_| BundleError::MissingFile(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a file with checksum verification.
    pub fn read_verified(&mut self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .manifest
            .find_file(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?
            .clone();

        let data = self.read_raw(path)?;

        let actual = FileEntry::compute_checksum(&data);
        if actual != entry.sha256 {
            return Err(BundleError::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.sha256,
                actual,
            });
        }

        debug!(path, "File verified");
        Ok(data)
    }

    /// Verify all files in the bundle.
    ///
    /// Returns list of paths that failed verification.
    pub fn verify_all(&mut self) -> Vec<String> {
        let paths: Vec<String> = self.manifest.files.iter().map(|f| f.path.clone()).collect();
        let mut failures = Vec::new();
        for path in paths {
            if let Err(e) = self.read_verified(&path) {
                warn!(path = %path, error = %e, "Verification failed");
                failures.push(path);
            }
        }
        failures
    }

    /// Read and parse a JSON file.
    pub fn read_json<T: serde::de::DeserializeOwned>(&mut self, path: &str) -> Result<T> {
        let data = self.read_verified(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Read the partition state.
    pub fn read_state<T: serde::de::DeserializeOwned>(&mut self) -> Result<T> {
        self.read_json(STATE_FILE_NAME)
    }
}
