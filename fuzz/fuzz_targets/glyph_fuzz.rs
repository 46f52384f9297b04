//! Fuzz target for the glyph codec
//!
//! Feeds arbitrary text through both directions of the codec looking for
//! panics and capacity violations.
//!
//! Run with: cargo +nightly fuzz run glyph_fuzz -- -max_total_time=60

#![no_main]

use itemdex_core::NAME_CAPACITY;
use itemdex_text::glyph;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Token text of any shape decodes to at most capacity glyphs
        assert!(glyph::decode_glyphs(input).len() <= NAME_CAPACITY);

        // Encoding always ends with the sentinel and never exceeds capacity
        let tokens = glyph::encode_tokens(input);
        assert_eq!(tokens.last().map(String::as_str), Some(glyph::SENTINEL));
        assert!(tokens.len() <= NAME_CAPACITY + 1);

        let _ = glyph::normalize(input);
    }
});
