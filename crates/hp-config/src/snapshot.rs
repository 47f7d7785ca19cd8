//! Configuration snapshots for run reports and checkpoint pinning.
//!
//! A snapshot captures the effective configuration at the start of a run.
//! Its combined hash covers everything that shapes the specification
//! (tunables, schema tables, PHI policy) and nothing that only shapes
//! scheduling, so a streaming run may resume with a different batch size
//! but not with a different value cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigPaths;
use crate::ProfilerConfig;

/// Keys of `ProfilerConfig` that only affect scheduling.
const SCHEDULING_KEYS: &[&str] = &["mode", "workers", "batch_size"];

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Effective tunables.
    pub config: ProfilerConfig,

    /// SHA-256 of the output-shaping tunables.
    pub config_hash: String,

    #[serde(default)]
    pub config_path: Option<String>,

    pub config_source: String,

    /// Fingerprint of the schema tables in use.
    pub schema_hash: String,

    #[serde(default)]
    pub schema_dir: Option<String>,

    pub schema_source: String,

    /// Fingerprint of the PHI policy in use.
    pub phi_policy_hash: String,

    #[serde(default)]
    pub phi_policy_path: Option<String>,

    pub phi_policy_source: String,

    /// Combined hash of all of the above (for quick comparison).
    pub combined_hash: String,
}

impl ConfigSnapshot {
    /// Create a new snapshot from loaded configuration.
    pub fn new(
        config: &ProfilerConfig,
        schema_fingerprint: &str,
        phi_policy_fingerprint: &str,
        paths: &ConfigPaths,
    ) -> Self {
        let config_hash = hash_profile_config(config);
        let combined_hash = hash_content(&format!(
            "{}:{}:{}",
            config_hash, schema_fingerprint, phi_policy_fingerprint
        ));

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            config: config.clone(),
            config_hash,
            config_path: paths.config.as_ref().map(|p| p.display().to_string()),
            config_source: paths.config_source.to_string(),
            schema_hash: schema_fingerprint.to_string(),
            schema_dir: paths.schema_dir.as_ref().map(|p| p.display().to_string()),
            schema_source: paths.schema_source.to_string(),
            phi_policy_hash: phi_policy_fingerprint.to_string(),
            phi_policy_path: paths.phi_policy.as_ref().map(|p| p.display().to_string()),
            phi_policy_source: paths.phi_policy_source.to_string(),
            combined_hash,
        }
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.combined_hash[..12.min(self.combined_hash.len())]
    }
}

fn hash_profile_config(config: &ProfilerConfig) -> String {
    let mut value = serde_json::to_value(config).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        for key in SCHEDULING_KEYS {
            map.remove(*key);
        }
    }
    hash_content(&value.to_string())
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunMode;

    fn snapshot(config: &ProfilerConfig) -> ConfigSnapshot {
        ConfigSnapshot::new(config, "schema", "phi", &ConfigPaths::default())
    }

    #[test]
    fn test_scheduling_does_not_change_hash() {
        let a = snapshot(&ProfilerConfig::default());
        let b = snapshot(&ProfilerConfig {
            mode: RunMode::Streaming,
            workers: 3,
            batch_size: 7,
            ..Default::default()
        });
        assert!(a.matches(&b));
    }

    #[test]
    fn test_output_shaping_changes_hash() {
        let a = snapshot(&ProfilerConfig::default());
        let b = snapshot(&ProfilerConfig {
            unique_value_cap: 5,
            ..Default::default()
        });
        assert!(!a.matches(&b));

        let c = ConfigSnapshot::new(
            &ProfilerConfig::default(),
            "other-schema",
            "phi",
            &ConfigPaths::default(),
        );
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_json_roundtrip_and_short_id() {
        let s = snapshot(&ProfilerConfig::default());
        let back = ConfigSnapshot::from_json(&s.to_json().unwrap()).unwrap();
        assert!(s.matches(&back));
        assert_eq!(s.short_id().len(), 12);
        assert_eq!(back.config_source, "builtin default");
    }
}
