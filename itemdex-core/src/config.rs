//! Repository layout configuration.
//!
//! Every path is relative to the project root chosen by the caller.

use crate::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the four record-store files and the icon directory live, and which
/// symbols anchor the tables inside them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryLayout {
    /// `#define ITEM_* 0x..` lines terminated by the count macro.
    pub id_header: PathBuf,
    /// Record array plus the positional graphics table.
    pub record_table: PathBuf,
    /// Tile, palette and description declarations.
    pub table_header: PathBuf,
    /// `#org @TAG` description segments.
    pub descriptions: PathBuf,
    /// One PNG per tile-symbol base name.
    pub icon_dir: PathBuf,
    /// Name of the record array, e.g. `gItemData`.
    pub record_array: String,
    /// Name of the graphics table, e.g. `gItemGraphicsTable`.
    pub graphics_table: String,
    /// Count macro terminating the id header, e.g. `ITEMS_COUNT`.
    pub count_macro: String,
    /// Symbols with this prefix are read-only while inline-defined.
    pub read_only_prefix: String,
}

impl RepositoryLayout {
    /// Layout of a stock decomp tree.
    pub fn standard() -> Self {
        Self {
            id_header: PathBuf::from("include/constants/items.h"),
            record_table: PathBuf::from("src/tables/item_tables.c"),
            table_header: PathBuf::from("include/new/item_tables.h"),
            descriptions: PathBuf::from("strings/item_descriptions.string"),
            icon_dir: PathBuf::from("graphics/item_sprites"),
            record_array: "gItemData".to_string(),
            graphics_table: "gItemGraphicsTable".to_string(),
            count_macro: "ITEMS_COUNT".to_string(),
            read_only_prefix: "DESC_".to_string(),
        }
    }

    /// Parse and validate a layout TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let layout: RepositoryLayout = toml::from_str(contents)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths: [(&'static str, &Path); 5] = [
            ("id_header", &self.id_header),
            ("record_table", &self.record_table),
            ("table_header", &self.table_header),
            ("descriptions", &self.descriptions),
            ("icon_dir", &self.icon_dir),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
            if path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be relative to the project root".to_string(),
                });
            }
        }

        let symbols: [(&'static str, &str); 3] = [
            ("record_array", &self.record_array),
            ("graphics_table", &self.graphics_table),
            ("count_macro", &self.count_macro),
        ];
        for (field, symbol) in symbols {
            if !is_identifier(symbol) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("'{}' is not a C identifier", symbol),
                });
            }
        }

        if self.read_only_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "read_only_prefix",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RepositoryLayout {
    fn default() -> Self {
        Self::standard()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
