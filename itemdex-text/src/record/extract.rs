//! Block extraction
//!
//! Locates record literals inside a larger array literal by brace depth, so a
//! name sub-array (itself brace-delimited) never confuses the span boundaries.

use crate::lexer::{assignment_value_start, matching_close, skip_trivia, MarkKind, Scanner};
use regex::Regex;
use std::ops::Range;

/// Designated-initializer key that marks a literal as a record.
pub const NAME_ANCHOR: &str = "name";

/// Byte range of one record literal, from its `{` through its matching `}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    pub start: usize,
    /// Exclusive; the byte after the closing brace.
    pub end: usize,
}

impl RecordSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }
}

/// Braces of a named array initializer such as `gItemData[] = { ... };`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayLiteral {
    pub open: usize,
    pub close: usize,
}

impl ArrayLiteral {
    /// Inner range, excluding both braces.
    pub fn body(&self) -> Range<usize> {
        self.open + 1..self.close
    }
}

/// Find the initializer braces of the array `name`.
///
/// Matches `name [..][..] = {` with any number of dimensions; declarations
/// without an initializer are skipped.
pub fn find_array(source: &str, name: &str) -> Option<ArrayLiteral> {
    let pattern = format!(r"\b{}\s*(?:\[[^\]\n]*\]\s*)*=\s*\{{", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let found = re.find_iter(source).find_map(|m| {
        let open = m.end() - 1;
        matching_close(source, open).map(|close| ArrayLiteral { open, close })
    });
    found
}

struct Frame {
    start: usize,
    anchored: bool,
}

/// Collects every record span whose braces lie within `range`.
///
/// A brace pair qualifies when a `.name =` assignment sits directly inside it
/// and its closing brace is followed by `,` or by the closing brace of the
/// enclosing array. Qualifying pairs nested in another record are part of it.
/// Spans come back in file order and never overlap.
pub fn extract_spans(source: &str, range: Range<usize>) -> Vec<RecordSpan> {
    let mut spans = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for mark in Scanner::starting_at(source, range.start) {
        if mark.span.start >= range.end {
            break;
        }
        match mark.kind {
            MarkKind::Open => stack.push(Frame {
                start: mark.span.start,
                anchored: false,
            }),
            MarkKind::Dot => {
                if let Some(top) = stack.last_mut() {
                    if !top.anchored
                        && assignment_value_start(source, mark.span.start, NAME_ANCHOR).is_some()
                    {
                        top.anchored = true;
                    }
                }
            }
            MarkKind::Close => {
                let Some(frame) = stack.pop() else {
                    continue;
                };
                if !frame.anchored {
                    continue;
                }
                let end = mark.span.end;
                let next = skip_trivia(source, end);
                if matches!(source.as_bytes().get(next), Some(b',') | Some(b'}')) {
                    spans.push(RecordSpan {
                        start: frame.start,
                        end,
                    });
                }
            }
            MarkKind::Eof => break,
        }
    }

    // An anchored literal nested inside an accepted record belongs to it.
    spans.sort_by_key(|s| s.start);
    let mut records: Vec<RecordSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if records.last().is_some_and(|outer| span.start < outer.end) {
            continue;
        }
        records.push(span);
    }
    records
}

/// Record spans of the array `array_name`, or `None` when the array is absent.
pub fn extract_records(source: &str, array_name: &str) -> Option<(ArrayLiteral, Vec<RecordSpan>)> {
    let array = find_array(source, array_name)?;
    let spans = extract_spans(source, array.body());
    Some((array, spans))
}

// ============================================================================
// TESTS
// ============================================================================
