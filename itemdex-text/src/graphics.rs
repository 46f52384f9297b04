//! Positional graphics table
//!
//! Row *i* of `gItemGraphicsTable` belongs to record *i*; the rows carry no
//! explicit key. Blank lines and `//` comment lines do not occupy a position.

use crate::lexer::insert_before_close;
use crate::record::find_array;
use itemdex_core::{GraphicsEntry, RecordId, TextError};
use once_cell::sync::Lazy;
use regex::Regex;

/// `{tileSymbol, paletteSymbol},`
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\s*(\w+)\s*,\s*(\w+)\s*\},?").expect("static regex"));

/// Suffix stripped from a tile symbol to get its icon asset base name.
pub const TILE_SUFFIX: &str = "Tiles";

/// Parsed graphics rows, indexed by record position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicsIndex {
    /// One slot per positional row; `None` when the row is not a plain pair.
    rows: Vec<Option<GraphicsEntry>>,
}

impl GraphicsIndex {
    /// Parse the table named `table_name` out of the record table source.
    pub fn parse(source: &str, table_name: &str) -> Result<Self, TextError> {
        let array = find_array(source, table_name)
            .ok_or_else(|| TextError::anchor("record table", format!("{} initializer", table_name)))?;

        let rows = source[array.body()]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .enumerate()
            .map(|(position, line)| {
                ROW.captures(line).and_then(|caps| {
                    Some(GraphicsEntry {
                        position,
                        tile_symbol: caps.get(1)?.as_str().to_string(),
                        palette_symbol: caps.get(2)?.as_str().to_string(),
                    })
                })
            })
            .collect();

        Ok(Self { rows })
    }

    /// Number of positional rows, including unrecognized ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entry(&self, position: RecordId) -> Option<&GraphicsEntry> {
        self.rows.get(position).and_then(Option::as_ref)
    }

    pub fn entries(&self) -> impl Iterator<Item = &GraphicsEntry> {
        self.rows.iter().flatten()
    }

    /// Icon asset base name for `position`: the tile symbol minus `Tiles`.
    pub fn lookup_icon(&self, position: RecordId) -> Option<&str> {
        let tile = &self.entry(position)?.tile_symbol;
        Some(tile.strip_suffix(TILE_SUFFIX).unwrap_or(tile))
    }

    /// Append a row to the table in `source`, returning the new source text.
    ///
    /// Rows are always appended last; `position` is only checked against the
    /// current row count.
    pub fn insert_row(
        &mut self,
        source: &str,
        table_name: &str,
        position: RecordId,
        tile_symbol: &str,
        palette_symbol: &str,
    ) -> Result<String, TextError> {
        let array = find_array(source, table_name)
            .ok_or_else(|| TextError::anchor("record table", format!("{} initializer", table_name)))?;

        if position != self.rows.len() {
            tracing::warn!(
                position,
                rows = self.rows.len(),
                "graphics row position does not match table length; appending at the end"
            );
        }

        let row = format!("    {{{}, {}}},\n", tile_symbol, palette_symbol);
        let updated = insert_before_close(source, array.close, &row);

        self.rows.push(Some(GraphicsEntry {
            position: self.rows.len(),
            tile_symbol: tile_symbol.to_string(),
            palette_symbol: palette_symbol.to_string(),
        }));
        Ok(updated)
    }
}

// ============================================================================
// TESTS
// ============================================================================
