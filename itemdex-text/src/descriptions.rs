//! Description store
//!
//! Tag-delimited text segments (`#org @TAG` followed by body lines). Tags that
//! the symbol table reports as read-only start out [`Mutability::ReadOnly`];
//! the first real edit promotes the symbol and makes the entry editable.

use crate::symbols::{Promotion, SymbolTable};
use indexmap::IndexMap;
use itemdex_core::{DescriptionEntry, Mutability, TextError, ROM_PLACEHOLDER};
use std::borrow::Cow;

/// Line prefix introducing a tagged segment.
pub const TAG_INTRODUCER: &str = "#org @";

const BOM: char = '\u{feff}';

/// What [`DescriptionStore::set`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionChange {
    /// The tag was read-only; its symbol was promoted and the text stored.
    Promoted,
    /// Text stored on an editable entry.
    Stored,
    /// Nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptionStore {
    /// Text before the first tag, re-emitted verbatim.
    preamble: String,
    entries: IndexMap<String, DescriptionEntry>,
    dirty: bool,
}

impl DescriptionStore {
    /// Parse a description file, classifying tags against `symbols`.
    ///
    /// A tag is only stored when at least one line follows it. Read-only
    /// symbols without a body get a text-less entry so lookups can show the
    /// ROM placeholder.
    pub fn parse(source: &str, symbols: &SymbolTable) -> Self {
        let source = source.strip_prefix(BOM).unwrap_or(source);
        let mut preamble = String::new();
        let mut entries: IndexMap<String, DescriptionEntry> = IndexMap::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in source.lines() {
            if let Some(rest) = line.strip_prefix(TAG_INTRODUCER) {
                flush_segment(current.take(), &mut entries, symbols);
                current = Some((rest.trim().to_string(), Vec::new()));
            } else if let Some((_, lines)) = current.as_mut() {
                lines.push(line.trim());
            } else {
                preamble.push_str(line);
                preamble.push('\n');
            }
        }
        flush_segment(current.take(), &mut entries, symbols);

        for tag in symbols.read_only() {
            if !entries.contains_key(tag) {
                entries.insert(
                    tag.to_string(),
                    DescriptionEntry {
                        tag: tag.to_string(),
                        text: None,
                        mutability: Mutability::ReadOnly,
                    },
                );
            }
        }

        if preamble.trim().is_empty() {
            preamble.clear();
        }

        tracing::debug!(entries = entries.len(), "parsed description store");
        Self {
            preamble,
            entries,
            dirty: false,
        }
    }

    /// Display text for `tag`: the stored body, the ROM placeholder for a
    /// read-only tag without one, or empty.
    pub fn get(&self, tag: &str) -> Cow<'_, str> {
        match self.entries.get(tag) {
            Some(DescriptionEntry { text: Some(text), .. }) => Cow::Borrowed(text.as_str()),
            Some(entry) if entry.is_read_only() => Cow::Borrowed(ROM_PLACEHOLDER),
            _ => Cow::Borrowed(""),
        }
    }

    pub fn entry(&self, tag: &str) -> Option<&DescriptionEntry> {
        self.entries.get(tag)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DescriptionEntry> {
        self.entries.values()
    }

    pub fn knows(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn is_read_only(&self, tag: &str) -> bool {
        self.entries.get(tag).is_some_and(DescriptionEntry::is_read_only)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `text` under `tag`, promoting its symbol first if the tag is read-only.
    ///
    /// Text is stored in the form [`DescriptionStore::parse`] would read it
    /// back: lines trimmed, no line opening a new segment. Empty text and the ROM placeholder are
    /// never stored.
    pub fn set(&mut self, symbols: &mut SymbolTable, tag: &str, text: &str) -> DescriptionChange {
        let text = normalize_body(text);
        let text = text.as_str();
        if text.is_empty() || text == ROM_PLACEHOLDER {
            tracing::debug!(tag, "ignoring empty description edit");
            return DescriptionChange::Unchanged;
        }

        let existing = self.entries.get(tag);
        let stored = existing.and_then(|e| e.text.as_deref()).unwrap_or("");
        if stored == text {
            return DescriptionChange::Unchanged;
        }

        let change = if existing.is_some_and(DescriptionEntry::is_read_only) {
            if symbols.promote(tag) == Promotion::Unknown {
                tracing::warn!(tag, "read-only description has no declaration to promote");
            }
            DescriptionChange::Promoted
        } else {
            DescriptionChange::Stored
        };

        self.entries.insert(
            tag.to_string(),
            DescriptionEntry {
                tag: tag.to_string(),
                text: Some(text.to_string()),
                mutability: Mutability::Editable,
            },
        );
        self.dirty = true;
        change
    }

    /// Append a new editable tag; fails if the tag is already known.
    pub fn insert_new(&mut self, tag: &str, text: &str) -> Result<(), TextError> {
        if self.entries.contains_key(tag) {
            return Err(TextError::DuplicateIdentifier {
                symbol: tag.to_string(),
            });
        }
        self.entries.insert(
            tag.to_string(),
            DescriptionEntry {
                tag: tag.to_string(),
                text: Some(normalize_body(text)),
                mutability: Mutability::Editable,
            },
        );
        self.dirty = true;
        Ok(())
    }

    /// Serialize every stored body in map order. ROM-only entries are skipped.
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .entries
            .values()
            .filter_map(|entry| {
                let text = entry.text.as_deref()?;
                let mut block = format!("{}{}\n", TAG_INTRODUCER, entry.tag);
                for line in text.lines() {
                    block.push_str(line);
                    block.push('\n');
                }
                Some(block)
            })
            .collect();

        let mut out = self.preamble.clone();
        out.push_str(&blocks.join("\n"));
        out
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call once the rendered text has been written out.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Trim every line and the body as a whole, and drop the `#` from any line
/// that would otherwise open a new segment.
fn normalize_body(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| {
            let line = line.trim();
            match line.strip_prefix('#') {
                Some(rest) if line.starts_with(TAG_INTRODUCER) => rest,
                _ => line,
            }
        })
        .collect();
    lines.join("\n").trim().to_string()
}

fn flush_segment(
    segment: Option<(String, Vec<&str>)>,
    entries: &mut IndexMap<String, DescriptionEntry>,
    symbols: &SymbolTable,
) {
    let Some((tag, lines)) = segment else {
        return;
    };
    if lines.is_empty() {
        return;
    }
    let text = lines.join("\n").trim().to_string();
    let mutability = if symbols.is_read_only(&tag) {
        Mutability::ReadOnly
    } else {
        Mutability::Editable
    };
    entries.insert(
        tag.clone(),
        DescriptionEntry {
            tag,
            text: Some(text),
            mutability,
        },
    );
}

// ============================================================================
// TESTS
// ============================================================================
