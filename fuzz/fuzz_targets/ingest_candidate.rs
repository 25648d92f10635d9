#![no_main]

use clavis_core::ingest::project_from_str;
use libfuzzer_sys::fuzz_target;

// Lenient ingest must never panic, whatever the model sends.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = project_from_str(text);
    }
});
