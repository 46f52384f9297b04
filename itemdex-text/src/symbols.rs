//! Symbol table over the table header.
//!
//! Tracks every tile, palette and description declaration, whether it is an
//! inline ROM pointer or an external declaration, and rewrites declarations in
//! place when a symbol is promoted.

use indexmap::IndexMap;
use itemdex_core::{StorageKind, Symbol, SymbolOrigin, TextError};
use once_cell::sync::Lazy;
use regex::Regex;

/// `#define NAME ((const u8 *) 0x08123456)`
static INLINE_DEFINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*#define[ \t]+(\w+)[ \t]+\(\([ \t]*(?:const[ \t]+)?(\w+)[ \t]*\*[ \t]*\)[^()\n]*\)[^\n]*",
    )
    .expect("static regex")
});

/// `extern const u8 NAME[];`
static EXTERN_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*extern[ \t]+(?:const[ \t]+)?(\w+)[ \t]+(\w+)[ \t]*\[[ \t]*\][ \t]*;")
        .expect("static regex")
});

/// Trailing include guard, possibly followed by a comment and blank lines.
static TRAILING_ENDIF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#endif\b[^\n]*\s*\z").expect("static regex"));

/// Outcome of [`SymbolTable::promote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// The inline definition was rewritten as an external declaration.
    Promoted,
    /// Already external; nothing to do.
    AlreadyExternal,
    /// The header does not declare this symbol.
    Unknown,
}

/// Declarations read from the table header, in file order.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    source: String,
    symbols: IndexMap<String, Symbol>,
    read_only_prefix: String,
    dirty: bool,
}

impl SymbolTable {
    /// Parse `source`. Inline definitions whose name starts with
    /// `read_only_prefix` are read-only until promoted.
    pub fn parse(source: &str, read_only_prefix: &str) -> Self {
        let mut found: Vec<(usize, Symbol)> = Vec::new();

        for caps in INLINE_DEFINE.captures_iter(source) {
            let (Some(all), Some(name), Some(base)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            found.push((
                all.start(),
                Symbol {
                    name: name.as_str().to_string(),
                    base_type: base.as_str().to_string(),
                    kind: StorageKind::InlineDefined,
                    origin: SymbolOrigin::PreexistingInFile,
                },
            ));
        }
        for caps in EXTERN_DECL.captures_iter(source) {
            let (Some(all), Some(base), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            found.push((
                all.start(),
                Symbol {
                    name: name.as_str().to_string(),
                    base_type: base.as_str().to_string(),
                    kind: StorageKind::ExternalDeclaration,
                    origin: SymbolOrigin::PreexistingInFile,
                },
            ));
        }
        found.sort_by_key(|(offset, _)| *offset);

        let mut symbols = IndexMap::with_capacity(found.len());
        for (_, symbol) in found {
            if symbols.contains_key(&symbol.name) {
                tracing::warn!(symbol = %symbol.name, "symbol declared more than once; keeping first");
                continue;
            }
            symbols.insert(symbol.name.clone(), symbol);
        }

        Self {
            source: source.to_string(),
            symbols,
            read_only_prefix: read_only_prefix.to_string(),
            dirty: false,
        }
    }

    /// An empty table, used when the header is missing.
    pub fn empty(read_only_prefix: &str) -> Self {
        Self::parse("", read_only_prefix)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Inline-defined and following the read-only naming convention.
    pub fn is_read_only(&self, name: &str) -> bool {
        self.symbols
            .get(name)
            .is_some_and(|s| s.is_inline() && name.starts_with(&self.read_only_prefix))
    }

    /// Names currently read-only, in file order.
    pub fn read_only(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .values()
            .filter(|s| self.is_read_only(&s.name))
            .map(|s| s.name.as_str())
    }

    /// Rewrite the inline definition of `name` as `extern const <type> name[];`.
    ///
    /// Never reverts: promoting an external declaration is a no-op.
    pub fn promote(&mut self, name: &str) -> Promotion {
        let Some(symbol) = self.symbols.get(name) else {
            tracing::debug!(symbol = name, "promotion requested for undeclared symbol");
            return Promotion::Unknown;
        };
        if !symbol.is_inline() {
            tracing::debug!(symbol = name, "symbol already external");
            return Promotion::AlreadyExternal;
        }

        let replacement = external_declaration(&symbol.base_type, name);
        let location = INLINE_DEFINE
            .captures_iter(&self.source)
            .find(|caps| caps.get(1).is_some_and(|m| m.as_str() == name))
            .and_then(|caps| caps.get(0))
            .map(|m| m.range());

        let Some(range) = location else {
            tracing::warn!(symbol = name, "inline definition vanished from header source");
            return Promotion::Unknown;
        };
        let indent_len = self.source[range.clone()].len() - self.source[range.clone()].trim_start().len();
        self.source
            .replace_range(range.start + indent_len..range.end, &replacement);

        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.kind = StorageKind::ExternalDeclaration;
        }
        self.dirty = true;
        tracing::debug!(symbol = name, "promoted inline definition to external declaration");
        Promotion::Promoted
    }

    /// Register a tool-introduced external declaration.
    pub fn declare_external(&mut self, name: &str, base_type: &str) -> Result<(), TextError> {
        if self.symbols.contains_key(name) {
            return Err(TextError::DuplicateIdentifier {
                symbol: name.to_string(),
            });
        }

        let line = format!("{}\n", external_declaration(base_type, name));
        match TRAILING_ENDIF.find(&self.source) {
            Some(endif) => {
                let at = endif.start();
                let before = &self.source[..at];
                let separator = if before.is_empty() || before.ends_with('\n') { "" } else { "\n" };
                self.source.insert_str(at, &format!("{}{}", separator, line));
            }
            None => {
                if !self.source.is_empty() && !self.source.ends_with('\n') {
                    self.source.push('\n');
                }
                self.source.push_str(&line);
            }
        }

        self.symbols.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                base_type: base_type.to_string(),
                kind: StorageKind::ExternalDeclaration,
                origin: SymbolOrigin::IntroducedByTool,
            },
        );
        self.dirty = true;
        Ok(())
    }

    /// Header text including every promotion and new declaration.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call once the rendered text has been written out.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

fn external_declaration(base_type: &str, name: &str) -> String {
    format!("extern const {} {}[];", base_type, name)
}

// ============================================================================
// TESTS
// ============================================================================
