//! Fuzz target for profiler.json and PHI policy parsing.
//!
//! Parsing and validation must return errors, never panic.

#![no_main]

use hp_config::{validate_profiler_config, ProfilerConfig};
use hp_redact::{PhiClassifier, PhiPolicy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = ProfilerConfig::parse_json(json) {
        let _ = validate_profiler_config(&config);
        let _ = config.effective_workers();
    }
    if let Ok(policy) = PhiPolicy::from_json(json) {
        let _ = PhiClassifier::new(&policy);
    }
});
