//! Field statistics accumulation.
//!
//! [`FieldAccumulator::update`] folds one decoded message into per-type,
//! per-path statistics; [`FieldAccumulator::merge`] combines two accumulators
//! built from disjoint inputs. Merge is associative and commutative with the
//! empty accumulator as identity, so any partitioning of the input yields the
//! same state.

mod shape;
mod stats;

pub use shape::{expected_shapes, Shape};
pub use stats::{FieldStatistics, TypeGuess};

use crate::decode::{encode_value, Delimiters, Message, Value};
use crate::logging::event_names;
use hp_common::{FieldPath, MergeInvariantViolation, SchemaGapWarning};
use hp_config::SchemaTables;
use hp_redact::PhiClassifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only lookups shared by every partition.
#[derive(Clone, Copy)]
pub struct AccumulateContext<'a> {
    pub tables: &'a SchemaTables,
    pub phi: &'a PhiClassifier,
    pub unique_value_cap: usize,
}

/// Statistics for one message type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeAccumulator {
    /// Messages of this type; the presence denominator for every path.
    pub messages: u64,
    pub fields: BTreeMap<FieldPath, FieldStatistics>,
}

impl TypeAccumulator {
    pub fn merge(&mut self, other: &TypeAccumulator) {
        self.messages += other.messages;
        for (path, stats) in &other.fields {
            match self.fields.get_mut(path) {
                Some(existing) => existing.merge(stats),
                None => {
                    self.fields.insert(path.clone(), stats.clone());
                }
            }
        }
    }

    /// Paths the schema tables do not describe.
    pub fn schema_gaps(&self) -> impl Iterator<Item = SchemaGapWarning> + '_ {
        self.fields
            .iter()
            .filter(|(_, s)| s.schema_gap)
            .map(|(path, _)| SchemaGapWarning { path: path.clone() })
    }

    pub fn check_invariants(&self) -> Result<(), MergeInvariantViolation> {
        for (path, stats) in &self.fields {
            stats.check_invariants(&path.to_string(), self.messages)?;
        }
        Ok(())
    }
}

/// Per-message-type statistics keyed by message type code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldAccumulator {
    pub types: BTreeMap<String, TypeAccumulator>,
}

/// What one message contributed to a path.
#[derive(Default)]
struct Seen {
    present: bool,
    /// Max non-empty repetitions over the segment occurrences; `Some` only
    /// for whole-field paths.
    repetitions: Option<u32>,
}

impl FieldAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Total messages over all types.
    pub fn messages(&self) -> u64 {
        self.types.values().map(|t| t.messages).sum()
    }

    /// Fold one decoded message in.
    pub fn update(&mut self, msg: &Message, ctx: &AccumulateContext<'_>) {
        let acc = self.types.entry(msg.message_type.clone()).or_default();
        acc.messages += 1;

        let mut seen: BTreeMap<FieldPath, Seen> = BTreeMap::new();
        for segment in &msg.segments {
            for (i, field) in segment.fields.iter().enumerate() {
                let Ok(index) = u16::try_from(i + 1) else {
                    break;
                };
                let path = FieldPath::field(segment.code.clone(), index);
                let reps = field.non_empty_repetitions() as u32;
                let entry = seen.entry(path.clone()).or_default();
                entry.repetitions = Some(entry.repetitions.unwrap_or(0).max(reps));
                // Make sure the bucket exists even when every repetition is empty.
                stats_for(acc, &path, ctx);
                for value in field.repetitions.iter().filter(|v| !v.is_empty()) {
                    observe(acc, &mut seen, &path, value, ctx);
                }
            }
        }

        for (path, s) in seen {
            let Some(stats) = acc.fields.get_mut(&path) else {
                continue;
            };
            if s.present {
                stats.presence += 1;
            }
            if let Some(reps) = s.repetitions {
                stats.repetitions.record(reps);
            }
        }
    }

    /// Fold `other` into `self`.
    pub fn merge_from(&mut self, other: &FieldAccumulator) {
        for (message_type, acc) in &other.types {
            self.types
                .entry(message_type.clone())
                .or_default()
                .merge(acc);
        }
        debug_assert!(self.check_invariants().is_ok());
    }

    /// `merge(a, b) -> c`
    pub fn merge(mut self, other: &FieldAccumulator) -> FieldAccumulator {
        self.merge_from(other);
        self
    }

    /// All types folded into one accumulator.
    pub fn combined(&self) -> TypeAccumulator {
        let mut combined = TypeAccumulator::default();
        for acc in self.types.values() {
            combined.merge(acc);
        }
        combined
    }

    pub fn check_invariants(&self) -> Result<(), MergeInvariantViolation> {
        for acc in self.types.values() {
            acc.check_invariants()?;
        }
        Ok(())
    }
}

fn stats_for<'s>(
    acc: &'s mut TypeAccumulator,
    path: &FieldPath,
    ctx: &AccumulateContext<'_>,
) -> &'s mut FieldStatistics {
    acc.fields.entry(path.clone()).or_insert_with(|| {
        let mut stats = FieldStatistics::new(ctx.unique_value_cap);
        if let Some(category) = ctx.phi.classify(path) {
            stats.mark_phi(category);
        }
        if !ctx.tables.knows(path) {
            stats.schema_gap = true;
            tracing::debug!(event = event_names::SCHEMA_GAP, path = %path, "schema gap");
        }
        stats
    })
}

/// Record one non-empty value at `path`, then recurse into its parts.
fn observe(
    acc: &mut TypeAccumulator,
    seen: &mut BTreeMap<FieldPath, Seen>,
    path: &FieldPath,
    value: &Value,
    ctx: &AccumulateContext<'_>,
) {
    seen.entry(path.clone()).or_default().present = true;
    let declared = ctx.tables.declared_type(path).map(str::to_string);
    let stats = stats_for(acc, path, ctx);
    stats.lengths.observe(value.text_len());

    let text = match value {
        Value::Scalar(s) => {
            let shape = Shape::classify(s);
            stats.count_shape(shape);
            match &declared {
                Some(t) => {
                    stats.count_guess(TypeGuess::Declared(t.clone()));
                    if expected_shapes(t).is_some_and(|ok| !ok.contains(&shape)) {
                        stats.count_guess(TypeGuess::Observed(shape));
                    }
                }
                None => stats.count_guess(TypeGuess::Observed(shape)),
            }
            s.clone()
        }
        Value::Composite(_) => {
            stats.count_shape(Shape::Composite);
            stats.count_guess(match &declared {
                Some(t) => TypeGuess::Declared(t.clone()),
                None => TypeGuess::Observed(Shape::Composite),
            });
            encode_value(value, &Delimiters::default())
        }
    };

    if !stats.is_phi() {
        if let Some(category) = ctx.phi.value_looks_sensitive(&text) {
            stats.mark_phi(category);
        } else {
            stats.collect_value(&text);
        }
    }

    let Value::Composite(parts) = value else {
        return;
    };
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let Ok(index) = u16::try_from(i + 1) else {
            break;
        };
        let child = match path.component_index() {
            None => Some(path.with_component(index)),
            Some(_) => path.with_subcomponent(index),
        };
        if let Some(child) = child {
            observe(acc, seen, &child, part, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use hp_redact::{PathPattern, PhiCategory, PhiPolicy};

    struct Fixture {
        tables: SchemaTables,
        phi: PhiClassifier,
    }

    impl Fixture {
        fn new(policy: PhiPolicy) -> Self {
            Fixture {
                tables: SchemaTables::builtin(),
                phi: PhiClassifier::new(&policy).unwrap(),
            }
        }

        fn ctx(&self) -> AccumulateContext<'_> {
            AccumulateContext {
                tables: &self.tables,
                phi: &self.phi,
                unique_value_cap: 10,
            }
        }

        fn run(&self, records: &[&str]) -> FieldAccumulator {
            let mut acc = FieldAccumulator::new();
            for raw in records {
                let msg = decode(raw, &self.tables).unwrap();
                acc.update(&msg, &self.ctx());
            }
            acc
        }
    }

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    const A: &str = "MSH|^~\\&|SYS|FAC|||20240101||ADT^A01|1|P|2.5\rPID|1||123^^^MRN||Doe^John||19800101|M";

    #[test]
    fn test_update_records_field_and_component_paths() {
        let fx = Fixture::new(PhiPolicy::empty());
        let acc = fx.run(&[A]);
        let adt = &acc.types["ADT^A01"];
        assert_eq!(adt.messages, 1);

        let name = &adt.fields[&path("PID.5")];
        assert_eq!(name.presence, 1);
        assert_eq!(name.lengths.max(), Some(7));
        assert_eq!(name.type_guesses[&TypeGuess::Declared("XPN".into())], 1);
        assert_eq!(name.values.count(&"Doe^John".to_string()), Some(1));

        let given = &adt.fields[&path("PID.5.2")];
        assert_eq!(given.values.count(&"John".to_string()), Some(1));
        assert!(!adt.fields.contains_key(&path("PID.5.1.1")));
        assert!(!adt.fields.contains_key(&path("MSH.3.1")));
        assert_eq!(adt.fields[&path("MSH.3")].values.count(&"SYS".to_string()), Some(1));
    }

    #[test]
    fn test_subcomponent_paths_only_when_present() {
        let fx = Fixture::new(PhiPolicy::empty());
        let with_prefix = "MSH|^~\\&|SYS|FAC|||||ADT^A01\rPID|1||7^^^MRN||Doe&van^Jan";
        let acc = fx.run(&[A, with_prefix]);
        let adt = &acc.types["ADT^A01"];
        assert_eq!(adt.fields[&path("PID.5.1")].presence, 2);
        let surname = &adt.fields[&path("PID.5.1.1")];
        assert_eq!(surname.presence, 1);
        assert_eq!(surname.values.count(&"Doe".to_string()), Some(1));
        assert_eq!(adt.fields[&path("PID.5.1.2")].presence, 1);
    }

    #[test]
    fn test_empty_field_counts_zero_bucket() {
        let fx = Fixture::new(PhiPolicy::empty());
        let acc = fx.run(&[A]);
        let pid2 = &acc.types["ADT^A01"].fields[&path("PID.2")];
        assert_eq!(pid2.presence, 0);
        assert_eq!(pid2.repetitions.get(0), 1);
        assert!(!acc.types["ADT^A01"].fields.contains_key(&path("PID.2.1")));
    }

    #[test]
    fn test_presence_counted_once_per_message() {
        let fx = Fixture::new(PhiPolicy::empty());
        let raw = "MSH|^~\\&|||||||ORU^R01\rOBX|1|NM|GLU||5.5\rOBX|2|NM|NA||140\rOBX|3|NM|K||4~4.1";
        let acc = fx.run(&[raw]);
        let obx5 = &acc.types["ORU^R01"].fields[&path("OBX.5")];
        assert_eq!(obx5.presence, 1);
        assert_eq!(obx5.lengths.count(), 4);
        assert_eq!(obx5.repetitions.get(2), 1);
        assert_eq!(obx5.repetitions.total(), 1);
    }

    #[test]
    fn test_observed_type_on_mismatch() {
        let fx = Fixture::new(PhiPolicy::empty());
        let raw = "MSH|^~\\&|||||||ORU^R01\rOBX|1|NM|GLU||5.5||||high";
        let acc = fx.run(&[raw]);
        let obx9 = &acc.types["ORU^R01"].fields[&path("OBX.9")];
        assert_eq!(obx9.type_guesses[&TypeGuess::Declared("NM".into())], 1);
        assert_eq!(obx9.type_guesses[&TypeGuess::Observed(Shape::String)], 1);
        let obx5 = &acc.types["ORU^R01"].fields[&path("OBX.5")];
        assert!(!obx5.type_guesses.contains_key(&TypeGuess::Observed(Shape::Float)));
    }

    #[test]
    fn test_phi_paths_keep_structure_without_values() {
        let fx = Fixture::new(PhiPolicy::default());
        let acc = fx.run(&[A]);
        let adt = &acc.types["ADT^A01"];
        for p in ["PID.5", "PID.5.1", "PID.5.2", "PID.7", "PID.3", "PID.3.1"] {
            let s = &adt.fields[&path(p)];
            assert!(s.is_phi(), "{}", p);
            assert!(s.values.is_empty(), "{}", p);
            assert_eq!(s.presence, 1, "{}", p);
        }
        assert!(!adt.fields[&path("PID.8")].is_phi());
    }

    #[test]
    fn test_component_pattern_withholds_whole_field() {
        let mut policy = PhiPolicy::empty();
        policy.patterns.push(PathPattern {
            pattern: r"^PID\.11\.1$".to_string(),
            category: PhiCategory::Address,
        });
        let fx = Fixture::new(policy);
        let raw = "MSH|^~\\&|||||||ADT^A01\rPID|1||||||||||12 Elm St^^Town";
        let acc = fx.run(&[raw]);
        let adt = &acc.types["ADT^A01"];
        for p in ["PID.11", "PID.11.1"] {
            let s = &adt.fields[&path(p)];
            assert!(s.is_phi(), "{}", p);
            assert!(s.values.is_empty(), "{}", p);
        }
        assert_eq!(adt.fields[&path("PID.11.3")].values.count(&"Town".to_string()), Some(1));
    }

    #[test]
    fn test_sensitive_value_marks_path() {
        let policy = PhiPolicy {
            detect_values: true,
            ..PhiPolicy::empty()
        };
        let fx = Fixture::new(policy);
        let raw = "MSH|^~\\&|||||||ADT^A01\rNTE|1||call 555-123-4567";
        let acc = fx.run(&[raw]);
        let note = &acc.types["ADT^A01"].fields[&path("NTE.3")];
        assert!(note.is_phi());
        assert!(note.values.is_empty());
    }

    #[test]
    fn test_schema_gap_bucket() {
        let fx = Fixture::new(PhiPolicy::empty());
        let raw = "MSH|^~\\&|||||||ADT^A01\rZPD|1|x^y";
        let acc = fx.run(&[raw]);
        let adt = &acc.types["ADT^A01"];
        let gap = &adt.fields[&path("ZPD.2")];
        assert!(gap.schema_gap);
        assert_eq!(gap.type_guesses[&TypeGuess::Observed(Shape::Composite)], 1);
        let gaps: Vec<String> = adt.schema_gaps().map(|g| g.path.to_string()).collect();
        assert!(gaps.contains(&"ZPD.2.1".to_string()));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let fx = Fixture::new(PhiPolicy::default());
        let acc = fx.run(&[A]);
        assert_eq!(acc.clone().merge(&FieldAccumulator::new()), acc);
        assert_eq!(FieldAccumulator::new().merge(&acc), acc);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let fx = Fixture::new(PhiPolicy::default());
        let b = "MSH|^~\\&|||||||ADT^A01\rPID|1||9^^^MRN||Roe^Ann||19900202|F";
        let whole = fx.run(&[A, b, A]);
        let split = fx.run(&[A]).merge(&fx.run(&[b, A]));
        assert_eq!(whole, split);
        assert!(whole.check_invariants().is_ok());
    }
}
