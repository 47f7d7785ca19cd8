//! Folding near-identical signatures into generalized patterns.
//!
//! Signatures are visited by count (descending), then by signature order.
//! Each one is aligned against the patterns built so far, in creation order,
//! using insertion/deletion-only alignment on segment codes. It folds into
//! the first pattern where:
//!
//! 1. every unmatched code is absent from the other side, and
//! 2. either the only edits are pattern positions already marked optional,
//!    or `count / (pattern count + count)` is below the rarity threshold.
//!
//! Folding marks unmatched positions optional and adds the count. A
//! signature that folds nowhere seeds a new pattern.

use super::signature::Signature;
use hp_common::SegmentCode;
use hp_math::{align_indel, AlignStep};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One position of a generalized pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternElement {
    pub segment: SegmentCode,
    pub repeated: bool,
    pub optional: bool,
}

/// A generalized segment order covering one or more signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub elements: Vec<PatternElement>,
    pub count: u64,
    /// Distinct signatures folded into this pattern.
    pub signatures: u64,
}

impl Pattern {
    fn seed(sig: &Signature, count: u64) -> Self {
        Pattern {
            elements: sig
                .elements()
                .iter()
                .map(|e| PatternElement {
                    segment: e.code.clone(),
                    repeated: e.repeated,
                    optional: false,
                })
                .collect(),
            count,
            signatures: 1,
        }
    }

    fn contains_code(&self, code: &SegmentCode) -> bool {
        self.elements.iter().any(|e| &e.segment == code)
    }

    /// Fold `sig` in if the rules allow it.
    fn try_fold(&mut self, sig: &Signature, count: u64, rarity_threshold: f64) -> bool {
        let alignment =
            align_indel(&self.elements, sig.elements(), |p, s| p.segment == s.code);

        let mut only_optional_deletions = true;
        for step in alignment.steps() {
            match *step {
                AlignStep::Match { .. } => {}
                AlignStep::LeftOnly(i) => {
                    let element = &self.elements[i];
                    if sig.contains_code(&element.segment) {
                        return false;
                    }
                    only_optional_deletions &= element.optional;
                }
                AlignStep::RightOnly(j) => {
                    if self.contains_code(&sig.elements()[j].code) {
                        return false;
                    }
                    only_optional_deletions = false;
                }
            }
        }

        let share = count as f64 / (self.count + count) as f64;
        if !only_optional_deletions && share >= rarity_threshold {
            return false;
        }

        let elements = alignment
            .steps()
            .iter()
            .map(|step| match *step {
                AlignStep::Match { left, right } => {
                    let mut e = self.elements[left].clone();
                    e.repeated |= sig.elements()[right].repeated;
                    e
                }
                AlignStep::LeftOnly(i) => PatternElement {
                    optional: true,
                    ..self.elements[i].clone()
                },
                AlignStep::RightOnly(j) => {
                    let e = &sig.elements()[j];
                    PatternElement {
                        segment: e.code.clone(),
                        repeated: e.repeated,
                        optional: true,
                    }
                }
            })
            .collect();
        self.elements = elements;
        self.count += count;
        self.signatures += 1;
        true
    }
}

/// Generalize a signature frequency table into patterns.
///
/// The result depends only on the table's contents, never on insertion
/// order. Patterns come out in descending count order.
pub fn generalize(table: &BTreeMap<Signature, u64>, rarity_threshold: f64) -> Vec<Pattern> {
    let mut ordered: Vec<(&Signature, u64)> = table
        .iter()
        .filter(|(_, &n)| n > 0)
        .map(|(sig, &n)| (sig, n))
        .collect();
    // BTreeMap iteration is already signature-ascending; the sort is stable.
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let mut patterns: Vec<Pattern> = Vec::new();
    for (sig, count) in ordered {
        let folded = patterns
            .iter_mut()
            .any(|p| p.try_fold(sig, count, rarity_threshold));
        if !folded {
            patterns.push(Pattern::seed(sig, count));
        }
    }

    // Stable: equal counts keep seed order.
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns
}
