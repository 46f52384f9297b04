//! Record repository
//!
//! Owns one consistent snapshot of the four record-store files and the icon
//! directory for the lifetime of an editing session. Edits only touch memory
//! until [`RecordRepository::save`]; adding a record and importing an icon
//! commit immediately and all-or-nothing.

use crate::commit::Commit;
use crate::icon::prepare_icon;
use heck::ToUpperCamelCase;
use itemdex_core::{
    FieldKey, FileError, ItemdexResult, NewRecord, Record, RecordId, RepositoryLayout, TextError,
    ValidationError,
};
use itemdex_text::glyph;
use itemdex_text::lexer::insert_before_close;
use itemdex_text::{
    extract_records, find_array, parse_record, render_literal, render_record, DescriptionChange,
    DescriptionStore, GraphicsIndex, IdAllocator, RecordSpan, SymbolTable,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Pointee type of tile and palette symbols.
const GRAPHICS_TYPE: &str = "u32";
/// Pointee type of description symbols.
const DESCRIPTION_TYPE: &str = "u8";

/// The record table text as loaded, plus where each record lives in it.
///
/// Saves always render from this baseline, never from a previous save.
#[derive(Debug, Clone)]
struct TableSnapshot {
    source: String,
    spans: Vec<RecordSpan>,
}

/// Description text prepared for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionView<'a> {
    pub tag: &'a str,
    pub text: Cow<'a, str>,
    pub read_only: bool,
}

/// Symbols derived from a new record's stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecordSymbols {
    pub constant: String,
    pub desc_tag: String,
    pub tile: String,
    pub palette: String,
    /// Icon file name without extension.
    pub icon_base: String,
}

impl NewRecordSymbols {
    pub fn derive(stem: &str, desc_prefix: &str) -> Self {
        let camel = stem.to_upper_camel_case();
        Self {
            constant: format!("ITEM_{}", stem),
            desc_tag: format!("{}{}", desc_prefix, stem),
            tile: format!("gItemIcon_{}Tiles", camel),
            palette: format!("gItemIcon_{}Palette", camel),
            icon_base: format!("gItemIcon_{}", camel),
        }
    }
}

/// In-memory view of a decomp item database.
#[derive(Debug)]
pub struct RecordRepository {
    root: PathBuf,
    layout: RepositoryLayout,
    allocator: IdAllocator,
    records: Vec<Record>,
    table: Option<TableSnapshot>,
    id_header: Option<String>,
    symbols: SymbolTable,
    descriptions: DescriptionStore,
    graphics: GraphicsIndex,
}

impl RecordRepository {
    /// Load with the standard layout.
    pub fn open(root: impl Into<PathBuf>) -> ItemdexResult<Self> {
        Self::load(root, RepositoryLayout::standard())
    }

    /// Read every file under `root`. Missing files and missing anchors
    /// degrade to empty state with a warning.
    pub fn load(root: impl Into<PathBuf>, layout: RepositoryLayout) -> ItemdexResult<Self> {
        layout.validate()?;
        let root = root.into();
        let allocator = IdAllocator::new(&layout.count_macro)?;

        let header_text = read_optional(&root.join(&layout.table_header))?;
        let symbols = match &header_text {
            Some(text) => SymbolTable::parse(text, &layout.read_only_prefix),
            None => SymbolTable::empty(&layout.read_only_prefix),
        };

        let description_text = read_optional(&root.join(&layout.descriptions))?;
        let descriptions = DescriptionStore::parse(description_text.as_deref().unwrap_or(""), &symbols);

        let id_header = read_optional(&root.join(&layout.id_header))?;

        let mut records = Vec::new();
        let mut graphics = GraphicsIndex::default();
        let table = match read_optional(&root.join(&layout.record_table))? {
            Some(source) => {
                let spans = match extract_records(&source, &layout.record_array) {
                    Some((_, spans)) => spans,
                    None => {
                        tracing::warn!(array = %layout.record_array, "record array not found; no records loaded");
                        Vec::new()
                    }
                };
                records = spans
                    .iter()
                    .enumerate()
                    .map(|(id, span)| parse_record(span.text(&source), id).record)
                    .collect();

                match GraphicsIndex::parse(&source, &layout.graphics_table) {
                    Ok(index) => graphics = index,
                    Err(e) => tracing::warn!(error = %e, "graphics table not loaded"),
                }
                Some(TableSnapshot { source, spans })
            }
            None => None,
        };

        if graphics.len() != records.len() && !graphics.is_empty() {
            tracing::warn!(
                rows = graphics.len(),
                records = records.len(),
                "graphics table and record array differ in length"
            );
        }

        tracing::info!(
            root = %root.display(),
            records = records.len(),
            symbols = symbols.len(),
            descriptions = descriptions.len(),
            graphics = graphics.len(),
            "repository loaded"
        );

        Ok(Self {
            root,
            layout,
            allocator,
            records,
            table,
            id_header,
            symbols,
            descriptions,
            graphics,
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &RepositoryLayout {
        &self.layout
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn descriptions(&self) -> &DescriptionStore {
        &self.descriptions
    }

    pub fn graphics(&self) -> &GraphicsIndex {
        &self.graphics
    }

    /// Records whose name contains `query`, ignoring case, in ordinal order.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Description of record `id` for display.
    pub fn description(&self, id: RecordId) -> ItemdexResult<DescriptionView<'_>> {
        let record = self.require(id)?;
        let tag = record.desc_tag();
        Ok(DescriptionView {
            tag,
            text: self.descriptions.get(tag),
            read_only: self.descriptions.is_read_only(tag),
        })
    }

    /// `<icon dir>/<base>.png` for record `id`, when the file exists.
    pub fn icon_path(&self, id: RecordId) -> Option<PathBuf> {
        let base = self.graphics.lookup_icon(id)?;
        let path = self.icon_file(base);
        path.is_file().then_some(path)
    }

    /// Raw bytes of the record's icon, if it has one on disk.
    pub fn icon_bytes(&self, id: RecordId) -> ItemdexResult<Option<Vec<u8>>> {
        let Some(path) = self.icon_path(id) else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path).map_err(|e| FileError::io(&path, &e))?;
        Ok(Some(bytes))
    }

    // ========================================================================
    // EDITS
    // ========================================================================

    /// Change one field of record `id` in memory.
    ///
    /// A non-empty description tag must be declared in the table header or
    /// present in the description store.
    pub fn apply_field_edit(&mut self, id: RecordId, key: FieldKey, value: &str) -> ItemdexResult<()> {
        let value = value.trim();
        if value.contains(['\n', ',']) {
            return Err(ValidationError::InvalidValue {
                field: key.source_key().to_string(),
                reason: "values may not contain commas or newlines".to_string(),
            }
            .into());
        }
        if key == FieldKey::DescTag
            && !value.is_empty()
            && !self.symbols.contains(value)
            && !self.descriptions.knows(value)
        {
            return Err(ValidationError::InvalidValue {
                field: key.source_key().to_string(),
                reason: format!("unknown description tag '{}'", value),
            }
            .into());
        }

        let record = self.require_mut(id)?;
        record.set_field(key, value);
        tracing::debug!(id, field = key.source_key(), "field edited");
        Ok(())
    }

    /// Rename record `id`. The stored name is what the glyph codec can
    /// represent: trimmed and cut to capacity.
    pub fn apply_name_edit(&mut self, id: RecordId, name: &str) -> ItemdexResult<String> {
        let normalized = glyph::normalize(name);
        let record = self.require_mut(id)?;
        record.name = normalized.clone();
        tracing::debug!(id, name = %normalized, "name edited");
        Ok(normalized)
    }

    /// Edit the description of record `id`, promoting a read-only tag on the
    /// first real change.
    pub fn apply_description_edit(&mut self, id: RecordId, text: &str) -> ItemdexResult<DescriptionChange> {
        let tag = self.require(id)?.desc_tag().to_string();
        if tag.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: FieldKey::DescTag.source_key().to_string(),
            }
            .into());
        }
        let change = self.descriptions.set(&mut self.symbols, &tag, text);
        if change == DescriptionChange::Promoted {
            tracing::info!(tag = %tag, "read-only description promoted to editable");
        }
        Ok(change)
    }

    // ========================================================================
    // ADD / IMPORT
    // ========================================================================

    /// Append a new record across all four files and write its icon.
    ///
    /// Everything is computed on copies first; the five files are then staged
    /// and persisted together. Pending edits are flushed by the same commit.
    pub fn add_record(&mut self, new: &NewRecord, icon_bytes: &[u8]) -> ItemdexResult<RecordId> {
        new.validate()?;
        let png = prepare_icon(icon_bytes)?;

        let table_path = self.root.join(&self.layout.record_table);
        let id_header_path = self.root.join(&self.layout.id_header);
        let rendered_table = self
            .render_table()
            .ok_or_else(|| FileError::Missing { path: table_path.clone() })?;
        let id_header = self
            .id_header
            .as_deref()
            .ok_or_else(|| FileError::Missing { path: id_header_path.clone() })?;

        let names = NewRecordSymbols::derive(&new.stem, &self.layout.read_only_prefix);
        let ordinal = self.records.len();

        let allocation = self.allocator.next_id(id_header)?;
        if allocation.next_id as usize != ordinal {
            tracing::warn!(
                next_id = allocation.next_id,
                ordinal,
                "allocated id differs from record position"
            );
        }
        let new_id_header = self.allocator.commit(id_header, &names.constant, allocation.next_id)?;

        let mut symbols = self.symbols.clone();
        symbols.declare_external(&names.tile, GRAPHICS_TYPE)?;
        symbols.declare_external(&names.palette, GRAPHICS_TYPE)?;
        symbols.declare_external(&names.desc_tag, DESCRIPTION_TYPE)?;

        let mut descriptions = self.descriptions.clone();
        descriptions.insert_new(&names.desc_tag, &new.description)?;

        let mut graphics = self.graphics.clone();
        let table = graphics.insert_row(
            &rendered_table,
            &self.layout.graphics_table,
            ordinal,
            &names.tile,
            &names.palette,
        )?;

        let mut record = Record::new(ordinal, glyph::normalize(&new.name));
        record.constant = Some(names.constant.clone());
        for key in FieldKey::ALL {
            record.set_field(key, new.field(key).trim());
        }
        record.set_field(FieldKey::DescTag, names.desc_tag.as_str());

        let array = find_array(&table, &self.layout.record_array).ok_or_else(|| {
            TextError::anchor(
                self.layout.record_table.display().to_string(),
                format!("{} initializer", self.layout.record_array),
            )
        })?;
        let table = insert_before_close(&table, array.close, &render_literal(&record));

        let icon_path = self.icon_file(&names.icon_base);
        if icon_path.exists() {
            tracing::warn!(path = %icon_path.display(), "overwriting existing icon for new record");
        }

        let mut commit = Commit::new();
        commit
            .write(&id_header_path, new_id_header.as_bytes())
            .write(self.root.join(&self.layout.table_header), symbols.source().as_bytes())
            .write(self.root.join(&self.layout.descriptions), descriptions.render().into_bytes())
            .write(&table_path, table.as_bytes())
            .write(&icon_path, png);
        commit.apply()?;

        // Committed: adopt the staged state as the new baseline.
        let spans = extract_records(&table, &self.layout.record_array)
            .map(|(_, spans)| spans)
            .unwrap_or_default();
        self.records = spans
            .iter()
            .enumerate()
            .map(|(id, span)| parse_record(span.text(&table), id).record)
            .collect();
        if self.records.len() != ordinal + 1 {
            tracing::warn!(
                records = self.records.len(),
                expected = ordinal + 1,
                "record count after add is unexpected"
            );
        }
        self.table = Some(TableSnapshot { source: table, spans });
        self.id_header = Some(new_id_header);
        symbols.mark_clean();
        descriptions.mark_clean();
        self.symbols = symbols;
        self.descriptions = descriptions;
        self.graphics = graphics;

        tracing::info!(
            id = allocation.next_id,
            ordinal,
            constant = %names.constant,
            "record added"
        );
        Ok(ordinal)
    }

    /// Replace the icon of existing record `id` and promote its graphics symbols.
    pub fn import_icon(&mut self, id: RecordId, icon_bytes: &[u8]) -> ItemdexResult<PathBuf> {
        self.require(id)?;
        let png = prepare_icon(icon_bytes)?;
        let entry = self
            .graphics
            .entry(id)
            .ok_or(TextError::MissingGraphicsRow { id })?;
        let base = self
            .graphics
            .lookup_icon(id)
            .ok_or(TextError::MissingGraphicsRow { id })?;
        let icon_path = self.icon_file(base);

        let mut symbols = self.symbols.clone();
        symbols.promote(&entry.tile_symbol);
        symbols.promote(&entry.palette_symbol);

        let mut commit = Commit::new();
        commit.write(&icon_path, png);
        if symbols.is_dirty() {
            commit.write(self.root.join(&self.layout.table_header), symbols.source().as_bytes());
        }
        commit.apply()?;

        symbols.mark_clean();
        self.symbols = symbols;
        tracing::info!(id, path = %icon_path.display(), "icon imported");
        Ok(icon_path)
    }

    // ========================================================================
    // SAVE
    // ========================================================================

    /// Write the record table (when loaded) and any changed header or
    /// description store. Returns the number of files written.
    pub fn save(&mut self) -> ItemdexResult<usize> {
        let mut commit = Commit::new();
        if let Some(table) = self.render_table() {
            commit.write(self.root.join(&self.layout.record_table), table.into_bytes());
        }
        if self.symbols.is_dirty() {
            commit.write(
                self.root.join(&self.layout.table_header),
                self.symbols.source().as_bytes(),
            );
        }
        if self.descriptions.is_dirty() {
            commit.write(
                self.root.join(&self.layout.descriptions),
                self.descriptions.render().into_bytes(),
            );
        }

        let written = commit.apply()?;
        self.symbols.mark_clean();
        self.descriptions.mark_clean();
        tracing::info!(files = written, records = self.records.len(), "repository saved");
        Ok(written)
    }

    /// The record table with every record re-rendered into its original span.
    fn render_table(&self) -> Option<String> {
        let table = self.table.as_ref()?;
        let mut out = String::with_capacity(table.source.len());
        let mut cursor = 0;
        for (span, record) in table.spans.iter().zip(&self.records) {
            out.push_str(&table.source[cursor..span.start]);
            out.push_str(&render_record(span.text(&table.source), record));
            cursor = span.end;
        }
        out.push_str(&table.source[cursor..]);
        Some(out)
    }

    fn icon_file(&self, base: &str) -> PathBuf {
        self.root.join(&self.layout.icon_dir).join(format!("{}.png", base))
    }

    fn require(&self, id: RecordId) -> Result<&Record, TextError> {
        self.records.get(id).ok_or(TextError::UnknownRecord { id })
    }

    fn require_mut(&mut self, id: RecordId) -> Result<&mut Record, TextError> {
        self.records.get_mut(id).ok_or(TextError::UnknownRecord { id })
    }
}

/// Read a text file, treating absence as `None`.
fn read_optional(path: &Path) -> Result<Option<String>, FileError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "file missing; continuing without it");
            Ok(None)
        }
        Err(e) => Err(FileError::io(path, &e)),
    }
}

// ============================================================================
// TESTS
// ============================================================================
