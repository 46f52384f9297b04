//! itemdex Core - Entity Types
//!
//! Pure data structures shared by the text engine and the repository.
//! This crate contains ONLY data types, errors and configuration - no file I/O
//! beyond reading the layout file.

mod config;
mod error;

pub use config::*;
pub use error::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Maximum number of glyphs a record name may hold.
pub const NAME_CAPACITY: usize = 13;

/// Icon assets must be exactly this many pixels wide and high.
pub const ICON_DIMENSION: u32 = 24;

/// Shown in place of a description whose text only lives in the ROM.
pub const ROM_PLACEHOLDER: &str = "[ROM defined]";

/// Ordinal position of a record in the record array, doubling as its numeric id.
pub type RecordId = usize;

// ============================================================================
// FIELD KEYS
// ============================================================================

/// Closed set of scalar fields tracked on every record.
///
/// Values are carried as opaque source text; nothing here interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKey {
    Price,
    HoldEffect,
    HoldParam,
    Pocket,
    Type,
    DescTag,
    Importance,
    Unk19,
    FieldUseFunc,
    BattleUsage,
    BattleUseFunc,
    SecondaryId,
}

impl FieldKey {
    pub const COUNT: usize = 12;

    /// Every key, in the order fields are written for new records.
    pub const ALL: [FieldKey; FieldKey::COUNT] = [
        FieldKey::Price,
        FieldKey::HoldEffect,
        FieldKey::HoldParam,
        FieldKey::Pocket,
        FieldKey::Type,
        FieldKey::DescTag,
        FieldKey::Importance,
        FieldKey::Unk19,
        FieldKey::FieldUseFunc,
        FieldKey::BattleUsage,
        FieldKey::BattleUseFunc,
        FieldKey::SecondaryId,
    ];

    /// Designated-initializer name used in the record table source.
    pub fn source_key(self) -> &'static str {
        match self {
            FieldKey::Price => "price",
            FieldKey::HoldEffect => "holdEffect",
            FieldKey::HoldParam => "holdEffectParam",
            FieldKey::Pocket => "pocket",
            FieldKey::Type => "type",
            FieldKey::DescTag => "description",
            FieldKey::Importance => "importance",
            FieldKey::Unk19 => "unk19",
            FieldKey::FieldUseFunc => "fieldUseFunc",
            FieldKey::BattleUsage => "battleUsage",
            FieldKey::BattleUseFunc => "battleUseFunc",
            FieldKey::SecondaryId => "secondaryId",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Price => "Price",
            FieldKey::HoldEffect => "HoldEffect",
            FieldKey::HoldParam => "HoldParam",
            FieldKey::Pocket => "Pocket",
            FieldKey::Type => "Type",
            FieldKey::DescTag => "Desc",
            FieldKey::Importance => "Importance",
            FieldKey::Unk19 => "Unk19",
            FieldKey::FieldUseFunc => "FieldUseFunc",
            FieldKey::BattleUsage => "BattleUsage",
            FieldKey::BattleUseFunc => "BattleUseFunc",
            FieldKey::SecondaryId => "SecondaryId",
        }
    }

    /// Resolve either a source key (`holdEffectParam`) or a label (`HoldParam`).
    pub fn parse(s: &str) -> Option<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.source_key() == s || key.label().eq_ignore_ascii_case(s))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One item's full field set, addressed by its ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Array index in the record table; also the numeric item id.
    pub id: RecordId,
    /// Decoded display name, at most [`NAME_CAPACITY`] glyphs.
    pub name: String,
    /// `ITEM_*` constant from the `.itemId` assignment, if the span has one.
    pub constant: Option<String>,
    fields: [String; FieldKey::COUNT],
}

impl Record {
    /// A record with every field empty.
    pub fn new(id: RecordId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            constant: None,
            fields: Default::default(),
        }
    }

    pub fn field(&self, key: FieldKey) -> &str {
        &self.fields[key.index()]
    }

    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        self.fields[key.index()] = value.into();
    }

    pub fn with_field(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Description tag (`DESC_*`), empty when the record has none.
    pub fn desc_tag(&self) -> &str {
        self.field(FieldKey::DescTag)
    }

    /// Iterate tracked fields in [`FieldKey::ALL`] order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        FieldKey::ALL.into_iter().map(move |key| (key, self.field(key)))
    }

    /// `ID: 5 / 0x05`
    pub fn id_label(&self) -> String {
        format!("ID: {} / {:#04X}", self.id, self.id)
    }

    /// Title-cased constant without its prefix: `ITEM_MASTER_BALL` -> `Master Ball`.
    pub fn constant_title(&self) -> Option<String> {
        let raw = self.constant.as_deref()?;
        let stem = raw.strip_prefix("ITEM_").unwrap_or(raw);
        let words: Vec<String> = stem
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            })
            .collect();
        Some(words.join(" "))
    }
}

// ============================================================================
// NEW RECORD
// ============================================================================

/// Caller-supplied values for a record that does not exist yet.
///
/// Symbol names are derived from `stem` (`SUPER_POTION` gives `ITEM_SUPER_POTION`,
/// `DESC_SUPER_POTION` and the `gItemIcon_SuperPotion*` graphics symbols), so
/// the description tag field is never taken from here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Upper-snake stem, e.g. `SUPER_POTION`.
    pub stem: String,
    pub name: String,
    pub description: String,
    fields: [String; FieldKey::COUNT],
}

impl NewRecord {
    /// Fields that must be non-empty besides stem, name and description.
    pub const REQUIRED: [FieldKey; 5] = [
        FieldKey::Price,
        FieldKey::HoldEffect,
        FieldKey::HoldParam,
        FieldKey::Pocket,
        FieldKey::Type,
    ];

    pub fn new(stem: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            name: name.into(),
            description: description.into(),
            fields: Default::default(),
        }
    }

    pub fn field(&self, key: FieldKey) -> &str {
        &self.fields[key.index()]
    }

    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        self.fields[key.index()] = value.into();
    }

    pub fn with_field(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Check required values are present and the stem can form C identifiers.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let named = [
            ("stem", self.stem.as_str()),
            ("name", self.name.as_str()),
            ("description", self.description.as_str()),
        ];
        for (field, value) in named {
            if value.trim().is_empty() {
                return Err(ValidationError::RequiredFieldMissing {
                    field: field.to_string(),
                });
            }
        }
        for key in Self::REQUIRED {
            if self.field(key).trim().is_empty() {
                return Err(ValidationError::RequiredFieldMissing {
                    field: key.source_key().to_string(),
                });
            }
        }

        let stem_ok = self.stem.starts_with(|c: char| c.is_ascii_uppercase())
            && self
                .stem
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !stem_ok {
            return Err(ValidationError::InvalidValue {
                field: "stem".to_string(),
                reason: format!("'{}' is not an upper-snake identifier", self.stem),
            });
        }

        for (key, value) in FieldKey::ALL.into_iter().map(|k| (k, self.field(k))) {
            if value.contains(['\n', ',']) {
                return Err(ValidationError::InvalidValue {
                    field: key.source_key().to_string(),
                    reason: "values may not contain commas or newlines".to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// SYMBOLS
// ============================================================================

/// How a symbol's storage is declared in the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// `#define NAME ((const u8 *) 0x...)` - ROM resident, read-only by convention.
    InlineDefined,
    /// `extern const u8 NAME[];` - storage owned by the tool.
    ExternalDeclaration,
}

/// Where a symbol declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolOrigin {
    PreexistingInFile,
    IntroducedByTool,
}

/// A declaration in the table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    /// Pointee type without `const`, e.g. `u8` or `u32`.
    pub base_type: String,
    pub kind: StorageKind,
    pub origin: SymbolOrigin,
}

impl Symbol {
    pub fn is_inline(&self) -> bool {
        self.kind == StorageKind::InlineDefined
    }
}

// ============================================================================
// DESCRIPTIONS
// ============================================================================

/// Whether a description may be written back to the description store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutability {
    ReadOnly,
    Editable,
}

/// A tagged description segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    pub tag: String,
    /// Body text; `None` when the text only exists in the ROM.
    pub text: Option<String>,
    pub mutability: Mutability,
}

impl DescriptionEntry {
    pub fn is_read_only(&self) -> bool {
        self.mutability == Mutability::ReadOnly
    }
}

// ============================================================================
// GRAPHICS / ID ALLOCATION
// ============================================================================

/// One row of the positional graphics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsEntry {
    pub position: RecordId,
    pub tile_symbol: String,
    pub palette_symbol: String,
}

/// Result of scanning the identifier header for the next free id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocation {
    /// Highest id currently defined before the count macro.
    pub last_id: u32,
    /// `last_id + 1`
    pub next_id: u32,
    /// Byte offset of the start of the count macro line.
    pub insertion_point: usize,
}

// ============================================================================
// TESTS
// ============================================================================
