//! Fuzz target for the full in-memory pipeline.
//!
//! Any input that parses must account for every row exactly once.

#![no_main]

use cleanse::Pipeline;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let mut input = b"id;email;phone;gender;date_of_birth\n".to_vec();
    input.extend_from_slice(data);

    if let Ok(output) = Pipeline::new().process_bytes(&input) {
        assert!(output.report.is_balanced());
    }
});
