//! Fuzz target for checkpoint bundle reading.
//!
//! Checkpoints are read back from disk after a crash, so a truncated or
//! corrupted archive must be an error, never a panic.

#![no_main]

use hp_bundle::CheckpointReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = CheckpointReader::from_bytes(data.to_vec()) {
        let _ = reader.verify_all();
        let _ = reader.read_state::<serde_json::Value>();
    }
});
