//! Record parsing and minimal-diff rewriting
//!
//! A record span is parsed into a [`Record`] while remembering the byte range
//! of every value it read. Rendering replaces only the ranges whose value
//! changed; every other byte of the span is copied through.

pub mod extract;

pub use extract::*;

use crate::glyph;
use crate::lexer::{assignment_value_start, matching_close, MarkKind, Scanner};
use itemdex_core::{FieldKey, Record, RecordId, NAME_CAPACITY};
use std::ops::Range;

/// Key of the read-only item constant assignment.
pub const CONSTANT_KEY: &str = "itemId";

/// A record together with where each of its values lives in the span text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub record: Record,
    /// Inside of the name braces.
    pub name_range: Option<Range<usize>>,
    field_ranges: [Option<Range<usize>>; FieldKey::COUNT],
}

impl ParsedRecord {
    pub fn field_range(&self, key: FieldKey) -> Option<Range<usize>> {
        let index = FieldKey::ALL.iter().position(|k| *k == key)?;
        self.field_ranges[index].clone()
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parse one record span (as returned by the extractor) into a record with id `id`.
///
/// Only designators sitting directly inside the record braces count;
/// assignments in comments, string literals or nested literals are ignored.
pub fn parse_record(span_text: &str, id: RecordId) -> ParsedRecord {
    let designators = designators(span_text);

    let name_range = designators
        .iter()
        .find(|(key, _)| *key == extract::NAME_ANCHOR)
        .and_then(|&(_, value)| {
            if span_text.as_bytes().get(value) != Some(&b'{') {
                return None;
            }
            let close = matching_close(span_text, value)?;
            Some(value + 1..close)
        });
    let name = name_range
        .as_ref()
        .map(|range| {
            glyph::decode_glyphs(&span_text[range.clone()])
                .into_iter()
                .take(NAME_CAPACITY)
                .collect::<String>()
                .trim()
                .to_string()
        })
        .unwrap_or_default();

    let mut record = Record::new(id, name);
    let mut field_ranges: [Option<Range<usize>>; FieldKey::COUNT] = Default::default();

    for (key, start) in designators {
        if span_text.as_bytes().get(start) == Some(&b'{') {
            continue;
        }
        let range = start..scalar_value_end(span_text, start);
        let value = &span_text[range.clone()];

        if key == CONSTANT_KEY {
            if record.constant.is_none() && !value.is_empty() {
                record.constant = Some(value.to_string());
            }
            continue;
        }
        let Some(field) = FieldKey::ALL.iter().position(|k| k.source_key() == key) else {
            continue;
        };
        if field_ranges[field].is_none() {
            record.set_field(FieldKey::ALL[field], value);
            field_ranges[field] = Some(range);
        }
    }

    ParsedRecord {
        record,
        name_range,
        field_ranges,
    }
}

/// `.key =` designators directly inside the outer braces, with the offset of
/// each value, in source order.
fn designators(span_text: &str) -> Vec<(&str, usize)> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    for mark in Scanner::new(span_text) {
        match mark.kind {
            MarkKind::Open => depth += 1,
            MarkKind::Close => depth = depth.saturating_sub(1),
            MarkKind::Dot if depth == 1 => {
                let key = designator_key(&span_text[mark.span.end..]);
                if key.is_empty() {
                    continue;
                }
                if let Some(value) = assignment_value_start(span_text, mark.span.start, key) {
                    found.push((key, value));
                }
            }
            _ => {}
        }
    }
    found
}

/// Identifier at the start of `rest`, or empty.
fn designator_key(rest: &str) -> &str {
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return "";
    }
    let len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..len]
}

/// End of a scalar value: the next `,`, `}`, newline or comment, minus
/// trailing whitespace.
fn scalar_value_end(span_text: &str, start: usize) -> usize {
    let rest = &span_text[start..];
    let mut end = rest.find([',', '}', '\n']).unwrap_or(rest.len());
    for opener in ["//", "/*"] {
        if let Some(at) = rest[..end].find(opener) {
            end = end.min(at);
        }
    }
    start + rest[..end].trim_end().len()
}

// ============================================================================
// WRITER
// ============================================================================

/// Re-render `original` so it carries `record`'s values.
///
/// Only values that differ from what `original` parses to are replaced, so an
/// unchanged record comes back byte-identical.
pub fn render_record(original: &str, record: &Record) -> String {
    let parsed = parse_record(original, record.id);
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    if record.name != parsed.record.name {
        match &parsed.name_range {
            Some(range) => edits.push((range.clone(), glyph::encode(&record.name))),
            None => tracing::debug!(id = record.id, "record span has no name array; name not written"),
        }
    }

    for (key, value) in record.fields() {
        if value == parsed.record.field(key) {
            continue;
        }
        match parsed.field_range(key) {
            Some(range) => edits.push((range, value.to_string())),
            None => tracing::debug!(
                id = record.id,
                field = key.source_key(),
                "field absent from record span; edit not written"
            ),
        }
    }

    if edits.is_empty() {
        return original.to_string();
    }

    edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut out = original.to_string();
    for (range, replacement) in edits {
        out.replace_range(range, &replacement);
    }
    out
}

/// A complete literal for a newly added record, one assignment per line.
///
/// Empty fields are omitted. The block ends with `},` and a newline.
pub fn render_literal(record: &Record) -> String {
    let mut out = String::from("    {\n");
    if let Some(constant) = &record.constant {
        out.push_str(&format!("        .{} = {},\n", CONSTANT_KEY, constant));
    }
    out.push_str(&format!(
        "        .{} = {{{}}},\n",
        extract::NAME_ANCHOR,
        glyph::encode(&record.name)
    ));
    for (key, value) in record.fields() {
        if value.is_empty() {
            continue;
        }
        out.push_str(&format!("        .{} = {},\n", key.source_key(), value));
    }
    out.push_str("    },\n");
    out
}

// ============================================================================
// TESTS
// ============================================================================
