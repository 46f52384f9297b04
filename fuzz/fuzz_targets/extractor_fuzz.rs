//! Fuzz target for record extraction and rewriting
//!
//! Arbitrary table text must never panic the extractor, and every span it
//! reports must re-render byte-identical when nothing was edited.
//!
//! Run with: cargo +nightly fuzz run extractor_fuzz -- -max_total_time=60

#![no_main]

use itemdex_text::{extract_records, parse_record, render_record};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let Some((array, spans)) = extract_records(input, "gItemData") else {
            return;
        };
        assert!(array.open < array.close);

        for (id, span) in spans.iter().enumerate() {
            assert!(span.start > array.open && span.start < span.end);
            assert!(span.end <= array.close);

            let text = span.text(input);
            let parsed = parse_record(text, id);
            assert_eq!(render_record(text, &parsed.record), text);
        }
    }
});
