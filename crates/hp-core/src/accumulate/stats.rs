//! Per-path statistics record.

use super::shape::Shape;
use hp_common::MergeInvariantViolation;
use hp_math::{BottomK, CountHistogram, LengthStats};
use hp_redact::PhiCategory;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A data type guess for one occurrence.
///
/// `Declared` comes from the schema; `Observed` is recorded next to it when
/// the value's shape does not fit the declared type, and alone for fields the
/// schema does not describe. Renders as `declared:XPN` / `observed:int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeGuess {
    Declared(String),
    Observed(Shape),
}

impl fmt::Display for TypeGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeGuess::Declared(t) => write!(f, "declared:{}", t),
            TypeGuess::Observed(s) => write!(f, "observed:{}", s),
        }
    }
}

impl FromStr for TypeGuess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("declared", t)) if !t.is_empty() => Ok(TypeGuess::Declared(t.to_string())),
            Some(("observed", shape)) => Ok(TypeGuess::Observed(shape.parse()?)),
            _ => Err(format!("invalid type guess: {}", s)),
        }
    }
}

impl Serialize for TypeGuess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeGuess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Mergeable statistics for one field path within one message type.
///
/// The messages-seen denominator lives on the owning type accumulator, so a
/// path first seen late in a run still divides by every message of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    /// Messages in which the path carried a non-empty value.
    pub presence: u64,
    /// Length of every non-empty occurrence.
    pub lengths: LengthStats,
    pub type_guesses: BTreeMap<TypeGuess, u64>,
    /// Shape of every non-empty occurrence.
    pub shapes: BTreeMap<Shape, u64>,
    pub values: BottomK<String>,
    /// Non-empty repetitions per message; whole-field paths only.
    pub repetitions: CountHistogram,
    /// Set when the path is PHI by policy or a value looked sensitive.
    pub phi: Option<PhiCategory>,
    /// The schema tables do not describe this path.
    pub schema_gap: bool,
}

impl FieldStatistics {
    pub fn new(cap: usize) -> Self {
        FieldStatistics {
            presence: 0,
            lengths: LengthStats::new(),
            type_guesses: BTreeMap::new(),
            shapes: BTreeMap::new(),
            values: BottomK::new(cap),
            repetitions: CountHistogram::new(),
            phi: None,
            schema_gap: false,
        }
    }

    pub fn is_phi(&self) -> bool {
        self.phi.is_some()
    }

    /// Mark the path as PHI and drop every value collected so far.
    pub fn mark_phi(&mut self, category: PhiCategory) {
        self.phi = Some(match self.phi {
            Some(existing) => existing.min(category),
            None => category,
        });
        self.values.clear();
    }

    pub fn count_guess(&mut self, guess: TypeGuess) {
        *self.type_guesses.entry(guess).or_insert(0) += 1;
    }

    pub fn count_shape(&mut self, shape: Shape) {
        *self.shapes.entry(shape).or_insert(0) += 1;
    }

    /// Insert a value verbatim unless the path is PHI.
    pub fn collect_value(&mut self, value: &str) {
        if self.phi.is_none() {
            self.values.insert(value.to_string());
        }
    }

    /// Most frequent shape; ties go to the earlier shape in [`Shape`] order.
    pub fn dominant_shape(&self) -> Option<Shape> {
        self.shapes
            .iter()
            .fold(None, |best: Option<(Shape, u64)>, (&shape, &n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((shape, n)),
            })
            .map(|(shape, _)| shape)
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &FieldStatistics) {
        self.presence += other.presence;
        self.lengths.merge(&other.lengths);
        for (guess, n) in &other.type_guesses {
            *self.type_guesses.entry(guess.clone()).or_insert(0) += n;
        }
        for (shape, n) in &other.shapes {
            *self.shapes.entry(*shape).or_insert(0) += n;
        }
        self.repetitions.merge(&other.repetitions);
        self.schema_gap |= other.schema_gap;
        self.values.merge(&other.values);
        match other.phi {
            Some(category) => self.mark_phi(category),
            None if self.phi.is_some() => self.values.clear(),
            None => {}
        }
    }

    /// Check the invariants that must hold for any reachable state.
    pub fn check_invariants(
        &self,
        path: &str,
        messages_seen: u64,
    ) -> Result<(), MergeInvariantViolation> {
        if self.presence > messages_seen {
            return Err(MergeInvariantViolation::new(
                path,
                format!("presence {} exceeds messages seen {}", self.presence, messages_seen),
            ));
        }
        if self.values.len() > self.values.cap() {
            return Err(MergeInvariantViolation::new(
                path,
                format!("{} values kept with cap {}", self.values.len(), self.values.cap()),
            ));
        }
        if self.is_phi() && !self.values.is_empty() {
            return Err(MergeInvariantViolation::new(path, "PHI path holds values"));
        }
        if self.repetitions.total() > messages_seen {
            return Err(MergeInvariantViolation::new(
                path,
                "repetition histogram counts more messages than were seen",
            ));
        }
        if self.lengths.count() < self.presence {
            return Err(MergeInvariantViolation::new(
                path,
                "fewer occurrences than messages with the path present",
            ));
        }
        if self.values.kept_total() > self.lengths.count() {
            return Err(MergeInvariantViolation::new(
                path,
                "value counts exceed observed occurrences",
            ));
        }
        Ok(())
    }
}
