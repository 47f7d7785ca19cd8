//! Specification building.
//!
//! The [`Specification`] is a pure function of the merged partition state,
//! the schema tables and the tunables. It carries no timestamps or run
//! identifiers, so two runs over the same input set serialize to the same
//! bytes.

use crate::accumulate::{FieldAccumulator, FieldStatistics, TypeAccumulator, TypeGuess};
use crate::logging::{event_names, Stage};
use crate::sequence::{Pattern, PatternElement, SequenceProfiler, SignatureTable};
use hp_common::{FieldPath, SegmentCode, SPEC_SCHEMA_VERSION};
use hp_config::{ProfilerConfig, SchemaTables};
use hp_redact::PhiCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a field is expected in every message of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    Required,
    Optional,
}

/// Why a field's values are withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSuppression {
    /// The path or one of its values is protected health information.
    Phi,
    /// The declared type is configured as not worth listing (timestamps,
    /// sequence numbers).
    DeclaredType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthSpec {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// Profile of one field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    /// Most frequent observed shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred_type: Option<String>,
    pub usage: Usage,
    pub presence: u64,
    pub messages_seen: u64,
    pub presence_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthSpec>,
    pub type_guesses: BTreeMap<TypeGuess, u64>,
    /// Messages by number of non-empty repetitions; whole fields only.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub repetitions: BTreeMap<u32, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phi: Option<PhiCategory>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub schema_gap: bool,
    pub values: BTreeMap<String, u64>,
    /// More distinct values were seen than the cap allows.
    pub values_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values_suppressed: Option<ValueSuppression>,
}

/// Profile of one segment code within a message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Messages containing the segment.
    pub messages: u64,
    pub presence_fraction: f64,
    /// Ever appeared in a consecutive run.
    pub repeats: bool,
    /// Field indices that held more than one non-empty repetition.
    pub repeating_fields: Vec<u16>,
    pub fields: BTreeMap<FieldPath, FieldSpec>,
}

/// A generalized segment order with its share of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub elements: Vec<PatternElement>,
    pub count: u64,
    pub percent: f64,
    pub signatures: u64,
}

/// Structure of one message type (or of all types combined).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTypeSpec {
    pub messages: u64,
    pub segments: BTreeMap<SegmentCode, SegmentSpec>,
    pub patterns: Vec<PatternSpec>,
}

/// Final output of a profiling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub schema_version: String,
    pub messages: u64,
    /// Empty in combined-only mode.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub message_types: BTreeMap<String, MessageTypeSpec>,
    pub combined: MessageTypeSpec,
    /// Types left out because no message of theirs was counted.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub omitted_types: Vec<String>,
}

impl Specification {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds a [`Specification`] from merged state.
pub struct SpecBuilder<'a> {
    tables: &'a SchemaTables,
    config: &'a ProfilerConfig,
}

impl<'a> SpecBuilder<'a> {
    pub fn new(tables: &'a SchemaTables, config: &'a ProfilerConfig) -> Self {
        SpecBuilder { tables, config }
    }

    /// Build the specification, or `None` when no message was profiled.
    pub fn build(
        &self,
        fields: &FieldAccumulator,
        sequences: &SequenceProfiler,
    ) -> Option<Specification> {
        let messages = fields.messages();
        if messages == 0 {
            return None;
        }

        let mut message_types = BTreeMap::new();
        let mut omitted_types = Vec::new();
        if !self.config.combined_only {
            for (message_type, acc) in &fields.types {
                if acc.messages == 0 {
                    tracing::warn!(
                        event = event_names::MESSAGE_TYPE_OMITTED,
                        stage = %Stage::Build,
                        message_type = %message_type,
                        "message type has no counted messages; omitted"
                    );
                    omitted_types.push(message_type.clone());
                    continue;
                }
                let table = sequences.types.get(message_type).cloned().unwrap_or_default();
                message_types.insert(message_type.clone(), self.type_spec(acc, &table));
            }
        }

        let combined = self.type_spec(&fields.combined(), &sequences.combined());

        tracing::info!(
            event = event_names::SPEC_BUILT,
            stage = %Stage::Build,
            messages,
            message_types = message_types.len(),
            paths = combined.segments.values().map(|s| s.fields.len()).sum::<usize>(),
            "specification built"
        );

        Some(Specification {
            schema_version: SPEC_SCHEMA_VERSION.to_string(),
            messages,
            message_types,
            combined,
            omitted_types,
        })
    }

    fn type_spec(&self, acc: &TypeAccumulator, table: &SignatureTable) -> MessageTypeSpec {
        let total = acc.messages;
        let mut segments: BTreeMap<SegmentCode, SegmentSpec> = BTreeMap::new();

        for (code, presence) in &table.segments {
            segments.insert(
                code.clone(),
                SegmentSpec {
                    description: self.tables.segment_description(code.as_str()).map(String::from),
                    messages: presence.messages,
                    presence_fraction: fraction(presence.messages, total),
                    repeats: presence.repeated > 0,
                    repeating_fields: Vec::new(),
                    fields: BTreeMap::new(),
                },
            );
        }

        for (path, stats) in &acc.fields {
            let Some(segment) = segments.get_mut(path.segment()) else {
                continue;
            };
            if path.depth() == 1 && stats.repetitions.max_bucket().is_some_and(|b| b > 1) {
                segment.repeating_fields.push(path.field_index());
            }
            segment
                .fields
                .insert(path.clone(), self.field_spec(path, stats, total));
        }

        let patterns = table
            .generalize(self.config.rarity_threshold)
            .into_iter()
            .map(|p| pattern_spec(p, table.messages))
            .collect();

        MessageTypeSpec {
            messages: total,
            segments,
            patterns,
        }
    }

    fn field_spec(&self, path: &FieldPath, stats: &FieldStatistics, total: u64) -> FieldSpec {
        let declared_type = self.tables.declared_type(path).map(String::from);
        let presence_fraction = fraction(stats.presence, total);
        let usage = if total > 0 && presence_fraction >= self.config.required_threshold {
            Usage::Required
        } else {
            Usage::Optional
        };

        let values_suppressed = if stats.is_phi() {
            Some(ValueSuppression::Phi)
        } else if declared_type
            .as_deref()
            .is_some_and(|t| self.config.suppresses_type(t))
        {
            Some(ValueSuppression::DeclaredType)
        } else {
            None
        };
        let values = match values_suppressed {
            Some(_) => BTreeMap::new(),
            None => stats.values.iter().map(|(v, n)| (v.clone(), n)).collect(),
        };

        let length = match (stats.lengths.min(), stats.lengths.max(), stats.lengths.mean()) {
            (Some(min), Some(max), Some(mean)) => Some(LengthSpec {
                min,
                max,
                mean: round_to(mean, 2),
            }),
            _ => None,
        };

        FieldSpec {
            description: self.tables.describe(path),
            declared_type,
            inferred_type: stats.dominant_shape().map(|s| s.as_str().to_string()),
            usage,
            presence: stats.presence,
            messages_seen: total,
            presence_fraction,
            length,
            type_guesses: stats.type_guesses.clone(),
            repetitions: stats.repetitions.iter().collect(),
            phi: stats.phi,
            schema_gap: stats.schema_gap,
            values,
            values_truncated: stats.values.overflowed() && values_suppressed.is_none(),
            values_suppressed,
        }
    }
}

fn pattern_spec(pattern: Pattern, total: u64) -> PatternSpec {
    PatternSpec {
        percent: round_to(fraction(pattern.count, total) * 100.0, 1),
        elements: pattern.elements,
        count: pattern.count,
        signatures: pattern.signatures,
    }
}

/// `part / total`, 0 when `total` is 0.
fn fraction(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::AccumulateContext;
    use crate::decode::decode;
    use hp_redact::{PhiClassifier, PhiPolicy};

    fn profile(records: &[&str], config: &ProfilerConfig) -> Option<Specification> {
        let tables = SchemaTables::builtin();
        let phi = PhiClassifier::new(&PhiPolicy::default()).unwrap();
        let ctx = AccumulateContext {
            tables: &tables,
            phi: &phi,
            unique_value_cap: config.unique_value_cap,
        };
        let mut fields = FieldAccumulator::new();
        let mut sequences = SequenceProfiler::new();
        for raw in records {
            let msg = decode(raw, &tables).unwrap();
            fields.update(&msg, &ctx);
            sequences.observe(&msg);
        }
        SpecBuilder::new(&tables, config).build(&fields, &sequences)
    }

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn seg(s: &str) -> SegmentCode {
        SegmentCode::parse(s).unwrap()
    }

    const WITH_SEX: &str = "MSH|^~\\&|||||20240101||ADT^A01|1\rPID|1||1^^^MRN||Doe^John||19800101|M";
    const NO_SEX: &str = "MSH|^~\\&|||||20240102||ADT^A01|2\rPID|1||2^^^MRN||Roe^Ann||19800101";

    #[test]
    fn test_usage_follows_threshold() {
        let spec = profile(&[WITH_SEX, NO_SEX], &ProfilerConfig::default()).unwrap();
        let pid = &spec.message_types["ADT^A01"].segments[&seg("PID")];
        assert_eq!(pid.fields[&path("PID.1")].usage, Usage::Required);
        let sex = &pid.fields[&path("PID.8")];
        assert_eq!(sex.usage, Usage::Optional);
        assert_eq!(sex.presence_fraction, 0.5);
        assert_eq!(sex.messages_seen, 2);
    }

    #[test]
    fn test_phi_and_type_suppression() {
        let spec = profile(&[WITH_SEX], &ProfilerConfig::default()).unwrap();
        let adt = &spec.message_types["ADT^A01"];
        let name = &adt.segments[&seg("PID")].fields[&path("PID.5")];
        assert_eq!(name.values_suppressed, Some(ValueSuppression::Phi));
        assert!(name.values.is_empty());
        assert!(name.length.is_some());

        let msh7 = &adt.segments[&seg("MSH")].fields[&path("MSH.7")];
        assert_eq!(msh7.values_suppressed, Some(ValueSuppression::DeclaredType));
        assert!(msh7.values.is_empty());

        let sex = &adt.segments[&seg("PID")].fields[&path("PID.8")];
        assert_eq!(sex.values.get("M"), Some(&1));
        assert_eq!(sex.description, "Administrative Sex");
    }

    #[test]
    fn test_combined_only_skips_types() {
        let config = ProfilerConfig {
            combined_only: true,
            ..ProfilerConfig::default()
        };
        let spec = profile(&[WITH_SEX, NO_SEX], &config).unwrap();
        assert!(spec.message_types.is_empty());
        assert_eq!(spec.combined.messages, 2);
    }

    #[test]
    fn test_patterns_report_percent() {
        let bare = "MSH|^~\\&|||||||ADT^A01\rPID|1\rPV1|1";
        let spec = profile(&[WITH_SEX, NO_SEX, bare], &ProfilerConfig::default()).unwrap();
        let patterns = &spec.message_types["ADT^A01"].patterns;
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].count, 2);
        assert_eq!(patterns[0].percent, 66.7);
        assert_eq!(patterns[1].percent, 33.3);
    }

    #[test]
    fn test_repeating_fields_listed() {
        let raw = "MSH|^~\\&|||||||ADT^A01\rPID|1||1^^^MRN~2^^^SSN";
        let spec = profile(&[raw], &ProfilerConfig::default()).unwrap();
        let pid = &spec.combined.segments[&seg("PID")];
        assert_eq!(pid.repeating_fields, vec![3]);
        assert!(pid.fields[&path("PID.3")].repetitions.contains_key(&2));
    }

    #[test]
    fn test_no_messages_yields_none() {
        let tables = SchemaTables::builtin();
        let config = ProfilerConfig::default();
        let builder = SpecBuilder::new(&tables, &config);
        assert!(builder
            .build(&FieldAccumulator::new(), &SequenceProfiler::new())
            .is_none());
    }

    #[test]
    fn test_zero_message_type_is_omitted() {
        let tables = SchemaTables::builtin();
        let config = ProfilerConfig::default();
        let phi = PhiClassifier::new(&PhiPolicy::default()).unwrap();
        let ctx = AccumulateContext {
            tables: &tables,
            phi: &phi,
            unique_value_cap: 10,
        };
        let mut fields = FieldAccumulator::new();
        let mut sequences = SequenceProfiler::new();
        let msg = decode(WITH_SEX, &tables).unwrap();
        fields.update(&msg, &ctx);
        sequences.observe(&msg);
        fields.types.insert("ORU^R01".into(), TypeAccumulator::default());

        let spec = SpecBuilder::new(&tables, &config)
            .build(&fields, &sequences)
            .unwrap();
        assert_eq!(spec.omitted_types, vec!["ORU^R01".to_string()]);
        assert!(!spec.message_types.contains_key("ORU^R01"));
    }
}
