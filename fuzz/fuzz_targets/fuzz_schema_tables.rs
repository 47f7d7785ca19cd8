//! Fuzz target for schema table parsing.
//!
//! The input is split on NUL bytes into the three table files.

#![no_main]

use hp_config::SchemaTables;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut parts = text.splitn(3, '\0');
    let segments = parts.next().unwrap_or("");
    let fields = parts.next().unwrap_or("{}");
    let datatypes = parts.next().unwrap_or("{}");
    if let Ok(tables) = SchemaTables::from_json_strs(segments, fields, datatypes) {
        let _ = tables.fingerprint();
        let _ = tables.is_composite("XPN");
    }
});
