//! Compiled PHI classifier.

use crate::{PhiCategory, PhiPolicy, RedactionError, Result, ValueDetector};
use hp_common::FieldPath;
use regex::RegexSet;

/// Highest component index tried when a pattern is matched against the
/// parts enclosed by a field.
pub const PATTERN_COMPONENT_SPAN: u16 = 32;

/// Highest subcomponent index tried likewise.
pub const PATTERN_SUBCOMPONENT_SPAN: u16 = 16;

/// A compiled [`PhiPolicy`].
///
/// A path is PHI when it equals a rule path, lies beneath one, or encloses
/// one. The last case matters for whole-field statistics: the value of
/// `PID.3` contains `PID.3.1`, so collecting it would leak the identifier.
///
/// Patterns follow the same three relations. Enclosed parts are enumerated
/// up to [`PATTERN_COMPONENT_SPAN`] components and
/// [`PATTERN_SUBCOMPONENT_SPAN`] subcomponents.
#[derive(Clone)]
pub struct PhiClassifier {
    rules: Vec<(FieldPath, PhiCategory)>,
    patterns: RegexSet,
    pattern_categories: Vec<PhiCategory>,
    detector: Option<ValueDetector>,
    fingerprint: String,
}

impl PhiClassifier {
    pub fn new(policy: &PhiPolicy) -> Result<Self> {
        let mut rules = Vec::with_capacity(policy.rules.len());
        for rule in &policy.rules {
            let path: FieldPath = rule.path.parse().map_err(|e: hp_common::PathParseError| {
                RedactionError::InvalidPath {
                    rule: rule.path.clone(),
                    message: e.to_string(),
                }
            })?;
            rules.push((path, rule.category));
        }

        // Compile one by one so the error names the offending pattern.
        for p in &policy.patterns {
            regex::Regex::new(&p.pattern)
                .map_err(|e| RedactionError::PatternError(format!("{}: {}", p.pattern, e)))?;
        }
        let patterns = RegexSet::new(policy.patterns.iter().map(|p| p.pattern.as_str()))
            .map_err(|e| RedactionError::PatternError(e.to_string()))?;
        let pattern_categories = policy.patterns.iter().map(|p| p.category).collect();

        tracing::debug!(
            rules = rules.len(),
            patterns = patterns.len(),
            detect_values = policy.detect_values,
            "phi classifier compiled"
        );

        Ok(Self {
            rules,
            patterns,
            pattern_categories,
            detector: policy.detect_values.then(ValueDetector::new),
            fingerprint: policy.fingerprint(),
        })
    }

    /// Category for `path`, if it is PHI.
    pub fn classify(&self, path: &FieldPath) -> Option<PhiCategory> {
        for (rule, category) in &self.rules {
            if path.starts_with(rule) || rule.starts_with(path) {
                return Some(*category);
            }
        }
        self.pattern_category(path)
    }

    fn pattern_category(&self, path: &FieldPath) -> Option<PhiCategory> {
        if self.patterns.is_empty() {
            return None;
        }

        let field = path.field_path();
        let mut candidates = vec![field.clone()];
        match path.component_index() {
            None => {
                for c in 1..=PATTERN_COMPONENT_SPAN {
                    let component = field.with_component(c);
                    candidates.extend(
                        (1..=PATTERN_SUBCOMPONENT_SPAN)
                            .filter_map(|s| component.with_subcomponent(s)),
                    );
                    candidates.push(component);
                }
            }
            Some(c) => {
                let component = field.with_component(c);
                if path.subcomponent_index().is_some() {
                    candidates.push(path.clone());
                } else {
                    candidates.extend(
                        (1..=PATTERN_SUBCOMPONENT_SPAN)
                            .filter_map(|s| component.with_subcomponent(s)),
                    );
                }
                candidates.push(component);
            }
        }

        candidates
            .iter()
            .filter_map(|candidate| {
                self.patterns
                    .matches(&candidate.to_string())
                    .into_iter()
                    .next()
            })
            .min()
            .map(|index| self.pattern_categories[index])
    }

    pub fn is_phi(&self, path: &FieldPath) -> bool {
        self.classify(path).is_some()
    }

    /// Category for a value that looks sensitive on its own, when value
    /// detection is enabled.
    pub fn value_looks_sensitive(&self, value: &str) -> Option<PhiCategory> {
        self.detector.as_ref().and_then(|d| d.detect(value))
    }

    /// Fingerprint of the policy this classifier was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for PhiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhiClassifier")
            .field("rules", &self.rules.len())
            .field("patterns", &self.patterns.len())
            .field("detect_values", &self.detector.is_some())
            .finish()
    }
}
