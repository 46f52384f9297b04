//! Property tests for the text engine, driven by the shared generators.

use itemdex_test_utils::generators::*;
use itemdex_test_utils::NAME_CAPACITY;
use itemdex_text::{extract_records, glyph, parse_record, render_record};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_display_names_round_trip(name in arb_display_name()) {
        let encoded = glyph::encode(&name);
        prop_assert!(encoded.ends_with(glyph::SENTINEL));
        prop_assert_eq!(glyph::decode(&encoded), name.clone());
        prop_assert_eq!(glyph::normalize(&name), name);
    }

    #[test]
    fn prop_token_streams_decode_within_capacity(stream in arb_token_stream()) {
        prop_assert!(glyph::decode_glyphs(&stream).len() <= NAME_CAPACITY);
    }

    #[test]
    fn prop_record_arrays_extract_every_record((source, count) in arb_record_array()) {
        let (array, spans) = extract_records(&source, "gItemData").unwrap();
        prop_assert_eq!(spans.len(), count);

        for (id, span) in spans.iter().enumerate() {
            prop_assert!(span.start > array.open && span.end <= array.close);
            let text = span.text(&source);
            let parsed = parse_record(text, id);
            prop_assert_eq!(render_record(text, &parsed.record), text);
        }
    }
}
