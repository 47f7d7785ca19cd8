//! PHI policy: which paths carry protected information.

use crate::PhiCategory;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Schema version for policy files.
pub const PHI_POLICY_SCHEMA_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    PHI_POLICY_SCHEMA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

/// A single flagged path, e.g. `PID.5` or `PID.3.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    pub path: String,
    pub category: PhiCategory,
}

impl PathRule {
    pub fn new(path: impl Into<String>, category: PhiCategory) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }
}

/// Regex over the dotted path text. Matches anywhere unless anchored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPattern {
    pub pattern: String,
    pub category: PhiCategory,
}

/// PHI policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhiPolicy {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Exact paths and their descendants.
    #[serde(default)]
    pub rules: Vec<PathRule>,

    /// Path regexes for whole families of fields.
    #[serde(default)]
    pub patterns: Vec<PathPattern>,

    /// Withhold values that look like SSNs, e-mail addresses or phone
    /// numbers even on unflagged paths.
    #[serde(default = "default_true")]
    pub detect_values: bool,
}

impl PhiPolicy {
    /// A policy that flags nothing and detects nothing.
    pub fn empty() -> Self {
        Self {
            schema_version: default_schema_version(),
            rules: Vec::new(),
            patterns: Vec::new(),
            detect_values: false,
        }
    }

    /// Load a policy from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a policy from JSON text.
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let policy: PhiPolicy = serde_json::from_str(content)?;
        if policy.schema_version != PHI_POLICY_SCHEMA_VERSION {
            return Err(crate::RedactionError::PolicyError(format!(
                "unsupported schema_version {:?} (expected {})",
                policy.schema_version, PHI_POLICY_SCHEMA_VERSION
            )));
        }
        Ok(policy)
    }

    /// Save policy to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// SHA-256 of the canonical JSON form, recorded in run reports so a
    /// profile can be traced to the policy that produced it.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    /// Add a rule, returning self for chaining.
    pub fn with_rule(mut self, path: impl Into<String>, category: PhiCategory) -> Self {
        self.rules.push(PathRule::new(path, category));
        self
    }
}

impl Default for PhiPolicy {
    fn default() -> Self {
        use PhiCategory::*;

        const DEFAULT_RULES: &[(&str, PhiCategory)] = &[
            // Patient identification
            ("PID.2.1", Identifier),
            ("PID.3.1", Identifier),
            ("PID.5", Name),
            ("PID.6", Name),
            ("PID.7", Date),
            ("PID.9", Name),
            ("PID.11.1", Address),
            ("PID.11.2", Address),
            ("PID.13.1", Contact),
            ("PID.13.6", Contact),
            ("PID.13.7", Contact),
            ("PID.14.1", Contact),
            ("PID.14.6", Contact),
            ("PID.14.7", Contact),
            ("PID.18", Identifier),
            ("PID.19", Identifier),
            ("PID.20", Identifier),
            ("PID.21", Identifier),
            ("PID.23", Address),
            // Merge
            ("MRG.1.1", Identifier),
            ("MRG.4.1", Identifier),
            ("MRG.7", Name),
            // Guarantor
            ("GT1.2", Identifier),
            ("GT1.3", Name),
            ("GT1.5", Address),
            ("GT1.6", Contact),
            ("GT1.7", Contact),
            ("GT1.20", Identifier),
            // Next of kin
            ("NK1.2", Name),
            ("NK1.4", Address),
            ("NK1.5", Contact),
            ("NK1.6", Contact),
            // Insurance
            ("IN1.16", Name),
            ("IN1.19", Address),
            ("IN2.2", Identifier),
            ("IN2.13", Identifier),
        ];

        Self {
            schema_version: default_schema_version(),
            rules: DEFAULT_RULES
                .iter()
                .map(|(path, category)| PathRule::new(*path, *category))
                .collect(),
            patterns: Vec::new(),
            detect_values: true,
        }
    }
}
