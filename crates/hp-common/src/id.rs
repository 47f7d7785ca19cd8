//! Run identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one profiling run.
///
/// Format: `run-<12 hex chars>`
/// Example: `run-3f2a9c01d4e7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a fresh run id.
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        RunId(format!("run-{}", &uuid[..12]))
    }

    /// Parse and validate a run id string.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("run-")?;
        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(RunId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let a = RunId::new();
        let b = RunId::new();
        assert!(a.as_str().starts_with("run-"));
        assert_eq!(a.as_str().len(), 16);
        assert_ne!(a, b);
        assert!(RunId::parse(a.as_str()).is_some());
    }

    #[test]
    fn test_run_id_parse_rejects_garbage() {
        assert!(RunId::parse("run-xyz").is_none());
        assert!(RunId::parse("job-0123456789ab").is_none());
        assert!(RunId::parse("run-0123456789ag").is_none());
    }
}
