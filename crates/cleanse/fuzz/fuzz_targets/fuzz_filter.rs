//! Fuzz target for the structural filter.
//!
//! The filter must never panic, whatever the bytes or delimiter, and every
//! kept row must be as wide as the header.

#![no_main]

use cleanse::input::StructuralFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 || data.is_empty() {
        return;
    }

    let delimiter = match data[0] % 4 {
        0 => b';',
        1 => b',',
        2 => b'\t',
        _ => b'|',
    };

    if let Ok(filtered) = StructuralFilter::new(delimiter, b'"').filter(&data[1..]) {
        assert!(filtered.rows.iter().all(|r| r.fields.len() == filtered.header.len()));
    }
});
