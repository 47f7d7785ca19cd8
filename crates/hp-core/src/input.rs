//! Input discovery and record splitting.
//!
//! Files are found recursively, ordered by size then path so runs over the
//! same tree always see records in the same order (resume depends on it).
//! Each file may hold one message or a batch; records start at every `MSH`
//! segment and batch envelope segments are dropped.

use crate::logging::{event_names, Stage};
use hp_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default input file extension.
pub const DEFAULT_EXTENSION: &str = "hl7";

/// Batch envelope segments (file/batch header and trailer).
const ENVELOPE_SEGMENTS: [&str; 4] = ["FHS", "BHS", "BTS", "FTS"];

/// One raw record and where it came from.
#[derive(Debug, Clone)]
pub struct Record {
    pub source: Arc<Path>,
    /// 0-based position within its file.
    pub index: usize,
    pub text: String,
}

impl Record {
    /// A record that did not come from a file.
    pub fn in_memory(index: usize, text: impl Into<String>) -> Self {
        Record {
            source: Arc::from(Path::new("<memory>")),
            index,
            text: text.into(),
        }
    }

    /// `path#index`, safe to log.
    pub fn locator(&self) -> String {
        format!("{}#{}", self.source.display(), self.index)
    }
}

/// A file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFailure {
    pub path: String,
    pub message: String,
}

impl From<InputFailure> for Error {
    fn from(f: InputFailure) -> Self {
        Error::InputRead {
            path: f.path,
            message: f.message,
        }
    }
}

/// Find input files under `root`.
///
/// A file given directly is used whatever its extension. Directories are
/// searched recursively for files whose extension matches `extension`
/// (case-insensitive).
pub fn discover(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(root).map_err(|_| Error::InputNotFound {
        path: root.display().to_string(),
    })?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| Error::InputRead {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::InputRead {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                pending.push(path);
            } else if meta.is_file() && has_extension(&path, extension) {
                found.push((meta.len(), path));
            }
        }
    }

    found.sort();
    tracing::info!(
        event = event_names::INPUT_DISCOVERED,
        stage = %Stage::Discover,
        root = %root.display(),
        files = found.len(),
        bytes = found.iter().map(|(n, _)| n).sum::<u64>(),
        "input discovered"
    );
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

/// Split file content into raw records.
///
/// Segments are re-joined with `\r`. Content before the first `MSH` becomes
/// a record of its own so it is counted as a decode failure rather than
/// silently lost.
pub fn split_records(text: &str) -> Vec<String> {
    let mut records: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.split(['\r', '\n']) {
        if line.trim().is_empty() {
            continue;
        }
        if ENVELOPE_SEGMENTS.iter().any(|s| line.starts_with(s)) {
            continue;
        }
        if line.starts_with("MSH") && !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
        current.push(line);
    }
    if !current.is_empty() {
        records.push(current);
    }
    records.into_iter().map(|segs| segs.join("\r")).collect()
}

/// Lazily reads files and yields their records in order.
///
/// Unreadable files yield one `Err` and the iteration continues.
pub struct RecordReader {
    files: std::vec::IntoIter<PathBuf>,
    pending: VecDeque<Record>,
}

impl RecordReader {
    pub fn new(files: Vec<PathBuf>) -> Self {
        RecordReader {
            files: files.into_iter(),
            pending: VecDeque::new(),
        }
    }

    fn load(&mut self, path: PathBuf) -> std::result::Result<(), InputFailure> {
        let bytes = fs::read(&path).map_err(|e| InputFailure {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let source: Arc<Path> = Arc::from(path.as_path());
        self.pending.extend(
            split_records(&text)
                .into_iter()
                .enumerate()
                .map(|(index, text)| Record {
                    source: Arc::clone(&source),
                    index,
                    text,
                }),
        );
        Ok(())
    }
}

impl Iterator for RecordReader {
    type Item = std::result::Result<Record, InputFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            let path = self.files.next()?;
            if let Err(failure) = self.load(path) {
                tracing::warn!(
                    event = event_names::INPUT_FAILED,
                    stage = %Stage::Discover,
                    path = %failure.path,
                    error = %failure.message,
                    "input file unreadable; skipped"
                );
                return Some(Err(failure));
            }
        }
    }
}
