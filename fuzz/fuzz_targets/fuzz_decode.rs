//! Fuzz target for the HL7 decoder.
//!
//! Decoding must never panic, and whatever decodes must re-encode to text
//! that decodes to the same tree and profiles without tripping a merge
//! invariant.

#![no_main]

use hp_config::SchemaTables;
use hp_core::accumulate::{AccumulateContext, FieldAccumulator};
use hp_core::decode::{decode, encode_message};
use hp_redact::{PhiClassifier, PhiPolicy};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

struct Env {
    tables: SchemaTables,
    phi: PhiClassifier,
}

fn env() -> &'static Env {
    static ENV: OnceLock<Env> = OnceLock::new();
    ENV.get_or_init(|| Env {
        tables: SchemaTables::builtin(),
        phi: PhiClassifier::new(&PhiPolicy::default()).expect("default policy compiles"),
    })
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let env = env();
    let Ok(msg) = decode(&text, &env.tables) else {
        return;
    };

    let again = encode_message(&msg, &msg.delimiters);
    // Escaped trailing whitespace comes back literal and is trimmed.
    if again.trim_end().len() != again.len() {
        return;
    }
    let redecoded = decode(&again, &env.tables).expect("re-encoded message decodes");
    assert_eq!(redecoded.segments, msg.segments);

    let ctx = AccumulateContext {
        tables: &env.tables,
        phi: &env.phi,
        unique_value_cap: 3,
    };
    let mut acc = FieldAccumulator::new();
    acc.update(&msg, &ctx);
    acc.update(&redecoded, &ctx);
    assert!(acc.check_invariants().is_ok());
});
