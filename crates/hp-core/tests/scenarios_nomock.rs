//! End-to-end scenarios over the public library API, without mocks.

use hp_common::{DecodeErrorKind, FieldPath, SegmentCode};
use hp_config::{ProfilerConfig, RunMode, SchemaTables};
use hp_core::accumulate::{AccumulateContext, TypeGuess};
use hp_core::coordinator::{Coordinator, PartitionState};
use hp_core::decode::{decode, encode_message, Value};
use hp_core::input::{InputFailure, Record};
use hp_core::spec::{SpecBuilder, Specification, Usage};
use hp_redact::{PhiClassifier, PhiPolicy};

struct Fixture {
    tables: SchemaTables,
    phi: PhiClassifier,
    config: ProfilerConfig,
}

impl Fixture {
    fn new(config: ProfilerConfig) -> Self {
        Fixture {
            tables: SchemaTables::builtin(),
            phi: PhiClassifier::new(&PhiPolicy::default()).unwrap(),
            config,
        }
    }

    fn ctx(&self) -> AccumulateContext<'_> {
        AccumulateContext {
            tables: &self.tables,
            phi: &self.phi,
            unique_value_cap: self.config.unique_value_cap,
        }
    }

    fn partition(&self, texts: &[String]) -> PartitionState {
        let mut state = PartitionState::new();
        for (i, text) in texts.iter().enumerate() {
            state.ingest(&Record::in_memory(i, text.as_str()), &self.ctx());
        }
        state
    }

    fn run(&self, texts: &[String]) -> PartitionState {
        let input: Vec<Result<Record, InputFailure>> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Ok(Record::in_memory(i, t.as_str())))
            .collect();
        Coordinator::new(self.ctx(), &self.config)
            .run(input, None, None)
            .unwrap()
            .state
    }

    fn spec(&self, state: &PartitionState) -> Specification {
        SpecBuilder::new(&self.tables, &self.config)
            .build(&state.fields, &state.sequences)
            .unwrap()
    }
}

fn path(s: &str) -> FieldPath {
    s.parse().unwrap()
}

fn code(s: &str) -> SegmentCode {
    SegmentCode::parse(s).unwrap()
}

fn adt(i: usize, sex: Option<&str>) -> String {
    format!(
        "MSH|^~\\&|SYS|FAC|||20240101120000||ADT^A01|MSG{}|P|2.5\rPID|1||{}^^^MRN||Doe^John||19800101|{}",
        i,
        i,
        sex.unwrap_or("")
    )
}

#[test]
fn test_scenario_a_decode_and_profile_single_message() {
    let fx = Fixture::new(ProfilerConfig::default());
    let raw = "MSH|^~\\&|SYS|FAC|||||ADT^A01\rPID|1||123^^^MRN||Doe^John||19800101|M\r";

    let msg = decode(raw, &fx.tables).unwrap();
    assert_eq!(msg.message_type, "ADT^A01");
    let pid = &msg.segments[1];
    assert_eq!(pid.code.as_str(), "PID");
    let name = &pid.field(5).unwrap().repetitions[0];
    assert_eq!(
        name,
        &Value::Composite(vec![
            Value::Scalar("Doe".to_string()),
            Value::Scalar("John".to_string())
        ])
    );

    let spec = fx.spec(&fx.run(&[raw.to_string()]));
    let pid5 = &spec.combined.segments[&code("PID")].fields[&path("PID.5")];
    assert_eq!(pid5.presence, 1);
    assert_eq!(pid5.declared_type.as_deref(), Some("XPN"));
    assert_eq!(pid5.type_guesses[&TypeGuess::Declared("XPN".to_string())], 1);
    assert!(pid5.values.is_empty(), "PID.5 is a name and must not list values");
    assert!(pid5.phi.is_some());
}

#[test]
fn test_scenario_b_presence_merges_across_partitions() {
    let fx = Fixture::new(ProfilerConfig::default());
    let first: Vec<String> = (0..500)
        .map(|i| adt(i, (i < 300).then_some("F")))
        .collect();
    let second: Vec<String> = (500..1000)
        .map(|i| adt(i, (i < 700).then_some("M")))
        .collect();

    let merged = fx.partition(&first).merge(&fx.partition(&second));
    let acc = &merged.fields.types["ADT^A01"];
    assert_eq!(acc.messages, 1000);
    assert_eq!(acc.fields[&path("PID.8")].presence, 500);

    let spec = fx.spec(&merged);
    let sex = &spec.message_types["ADT^A01"].segments[&code("PID")].fields[&path("PID.8")];
    assert_eq!(sex.messages_seen, 1000);
    assert_eq!(sex.presence_fraction, 0.5);
    assert_eq!(sex.usage, Usage::Optional);
    assert_eq!(sex.values.get("F"), Some(&300));
    assert_eq!(sex.values.get("M"), Some(&200));
}

#[test]
fn test_scenario_c_rare_trailing_segment_folds_as_optional() {
    let fx = Fixture::new(ProfilerConfig {
        rarity_threshold: 0.2,
        ..ProfilerConfig::default()
    });
    let base = "MSH|^~\\&|LAB|FAC|||||ORU^R01\rPID|1\rOBR|1\rOBX|1|NM|GLU||5.4\rOBX|2|NM|K||4.1";
    let mut texts: Vec<String> = (0..900).map(|_| base.to_string()).collect();
    texts.extend((0..100).map(|_| format!("{}\rNTE|1||fasting", base)));

    let spec = fx.spec(&fx.run(&texts));
    let patterns = &spec.message_types["ORU^R01"].patterns;
    assert_eq!(patterns.len(), 1);
    let pattern = &patterns[0];
    assert_eq!(pattern.count, 1000);
    assert_eq!(pattern.signatures, 2);
    let shape: Vec<(&str, bool, bool)> = pattern
        .elements
        .iter()
        .map(|e| (e.segment.as_str(), e.repeated, e.optional))
        .collect();
    assert_eq!(
        shape,
        vec![
            ("MSH", false, false),
            ("PID", false, false),
            ("OBR", false, false),
            ("OBX", true, false),
            ("NTE", false, true),
        ]
    );
}

#[test]
fn test_scenario_d_missing_header_is_skipped() {
    let fx = Fixture::new(ProfilerConfig::default());
    let good: Vec<String> = (0..20).map(|i| adt(i, Some("F"))).collect();
    let mut with_bad = good.clone();
    with_bad.insert(7, "PID|1||999^^^MRN||Roe^Jane".to_string());

    let clean = fx.run(&good);
    let dirty = fx.run(&with_bad);
    assert_eq!(dirty.counters.records, 21);
    assert_eq!(dirty.counters.decoded, 20);
    assert_eq!(dirty.counters.decode_errors[&DecodeErrorKind::MissingHeader], 1);
    assert_eq!(dirty.fields, clean.fields);
    assert_eq!(dirty.sequences, clean.sequences);
}

#[test]
fn test_merge_with_empty_is_identity() {
    let fx = Fixture::new(ProfilerConfig::default());
    let texts: Vec<String> = (0..30).map(|i| adt(i, Some("M"))).collect();
    let state = fx.partition(&texts);
    assert_eq!(state.clone().merge(&PartitionState::new()), state);
    assert_eq!(PartitionState::new().merge(&state), state);
}

#[test]
fn test_decode_then_encode_reproduces_fields() {
    let fx = Fixture::new(ProfilerConfig::default());
    let raw = "MSH|^~\\&|SYS|FAC|||||ORU^R01\rPID|1||1^^^A~2^^^B||O\\T\\Brien^Pat\rOBX|1|TX|NOTE||a\\F\\b";
    let msg = decode(raw, &fx.tables).unwrap();
    assert_eq!(encode_message(&msg, &msg.delimiters), raw);

    let other = "MSH#$*@%#SYS#FAC#####ORU$R01\rPID#1##1$$$A*2$$$B##O@T@Brien$Pat";
    let msg = decode(other, &fx.tables).unwrap();
    assert_eq!(encode_message(&msg, &msg.delimiters), other);
}

#[test]
fn test_every_phi_path_has_no_values() {
    let fx = Fixture::new(ProfilerConfig::default());
    let texts: Vec<String> = (0..50)
        .map(|i| {
            format!(
                "MSH|^~\\&|SYS|FAC|||||ADT^A04\rPID|1||{}^^^MRN||Doe{}^John||19800101|F|||1 Main St^^Town\rNK1|1|Doe^Jane|SPO|||555-123-4567",
                i, i
            )
        })
        .collect();
    let spec = fx.spec(&fx.run(&texts));
    let mut phi_paths = 0;
    for segment in spec.combined.segments.values() {
        for field in segment.fields.values() {
            assert!(field.presence <= field.messages_seen);
            assert!(field.values.len() <= fx.config.unique_value_cap);
            if field.phi.is_some() {
                phi_paths += 1;
                assert!(field.values.is_empty());
                assert_eq!(field.length.is_some(), field.presence > 0);
            }
        }
    }
    assert!(phi_paths > 0);
}

#[test]
fn test_streaming_mode_matches_parallel_mode() {
    let texts: Vec<String> = (0..64).map(|i| adt(i, (i % 3 == 0).then_some("F"))).collect();
    let parallel = Fixture::new(ProfilerConfig {
        workers: 4,
        ..ProfilerConfig::default()
    });
    let streaming = Fixture::new(ProfilerConfig {
        mode: RunMode::Streaming,
        batch_size: 7,
        ..ProfilerConfig::default()
    });
    let a = parallel.spec(&parallel.run(&texts)).to_json_pretty().unwrap();
    let b = streaming.spec(&streaming.run(&texts)).to_json_pretty().unwrap();
    assert_eq!(a, b);
}
