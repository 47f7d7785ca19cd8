//! Value-shape detection for PHI that slips past path rules.
//!
//! Free-text fields and vendor Z-segments sometimes carry identifiers. The
//! detector looks at the value itself and reports the category of the first
//! matching pattern.

use crate::PhiCategory;
use once_cell::sync::Lazy;
use regex::Regex;

/// Detection pattern definition.
struct DetectionPattern {
    category: PhiCategory,
    pattern: Lazy<Regex>,
    description: &'static str,
}

// Pre-compiled detection patterns
static PATTERNS: [DetectionPattern; 3] = [
    DetectionPattern {
        category: PhiCategory::Identifier,
        pattern: Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        description: "US social security number",
    },
    DetectionPattern {
        category: PhiCategory::Contact,
        pattern: Lazy::new(|| {
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
        }),
        description: "E-mail address",
    },
    DetectionPattern {
        category: PhiCategory::Contact,
        pattern: Lazy::new(|| {
            Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}[-. ])\d{3}[-. ]\d{4}\b").unwrap()
        }),
        description: "Separated phone number",
    },
];

/// Detector for sensitive-looking values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDetector;

impl ValueDetector {
    pub fn new() -> Self {
        Self
    }

    /// Category of the first pattern `value` matches.
    pub fn detect(&self, value: &str) -> Option<PhiCategory> {
        if value.is_empty() {
            return None;
        }
        let hit = PATTERNS.iter().find(|p| p.pattern.is_match(value))?;
        tracing::trace!(pattern = hit.description, "sensitive value shape");
        Some(hit.category)
    }
}
