//! Sequential id allocation over the identifier header.

use itemdex_core::{IdAllocation, TextError};
use once_cell::sync::Lazy;
use regex::Regex;

/// `#define ITEM_FOO 0x1A3`
static ID_DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*#define[ \t]+(\w+)[ \t]+0[xX]([0-9A-Fa-f]+)\b").expect("static regex"));

const HEADER_FILE: &str = "id header";

/// Finds the next free id and writes new id macros.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    count_macro: String,
    count_line: Regex,
}

impl IdAllocator {
    /// An allocator keyed on the count macro, e.g. `ITEMS_COUNT`.
    pub fn new(count_macro: &str) -> Result<Self, TextError> {
        let pattern = format!(r"(?m)^[ \t]*#define[ \t]+{}\b[^\n]*", regex::escape(count_macro));
        let count_line = Regex::new(&pattern)
            .map_err(|_| TextError::anchor(HEADER_FILE, format!("#define {}", count_macro)))?;
        Ok(Self {
            count_macro: count_macro.to_string(),
            count_line,
        })
    }

    /// Scan backward from the count macro for the nearest hex id macro.
    pub fn next_id(&self, header: &str) -> Result<IdAllocation, TextError> {
        let count = self
            .count_line
            .find(header)
            .ok_or_else(|| TextError::anchor(HEADER_FILE, format!("#define {}", self.count_macro)))?;
        let insertion_point = count.start();

        let last_id = header[..insertion_point]
            .lines()
            .rev()
            .find_map(|line| {
                let caps = ID_DEFINE.captures(line)?;
                u32::from_str_radix(caps.get(2)?.as_str(), 16).ok()
            })
            .ok_or_else(|| {
                TextError::anchor(
                    HEADER_FILE,
                    format!("#define ITEM_* 0x.. before {}", self.count_macro),
                )
            })?;

        Ok(IdAllocation {
            last_id,
            next_id: last_id.saturating_add(1),
            insertion_point,
        })
    }

    /// Insert `#define symbol 0x..` before the count macro and point the count
    /// macro at it. Returns the new header text.
    pub fn commit(&self, header: &str, symbol: &str, id: u32) -> Result<String, TextError> {
        if header.lines().any(|line| {
            ID_DEFINE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .is_some_and(|m| m.as_str() == symbol)
        }) {
            return Err(TextError::DuplicateIdentifier {
                symbol: symbol.to_string(),
            });
        }

        let allocation = self.next_id(header)?;
        if id != allocation.next_id {
            tracing::warn!(id, expected = allocation.next_id, "committing non-sequential id");
        }

        let count = self
            .count_line
            .find(&header[allocation.insertion_point..])
            .ok_or_else(|| TextError::anchor(HEADER_FILE, format!("#define {}", self.count_macro)))?;
        let count_end = allocation.insertion_point + count.end();

        let mut out = String::with_capacity(header.len() + symbol.len() * 2 + 32);
        out.push_str(&header[..allocation.insertion_point]);
        out.push_str(&format!("#define {} {:#X}\n", symbol, id));
        out.push_str(&format!("#define {} ({} + 1)", self.count_macro, symbol));
        out.push_str(&header[count_end..]);
        Ok(out)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "#ifndef GUARD_CONSTANTS_ITEMS_H
#define GUARD_CONSTANTS_ITEMS_H

#define ITEM_NONE 0x0
#define ITEM_MASTER_BALL 0x1
// ...
#define ITEM_OLD_SEA_MAP 0x1A3

#define ITEMS_COUNT (ITEM_OLD_SEA_MAP + 1)

#endif  // GUARD_CONSTANTS_ITEMS_H
";

    fn allocator() -> IdAllocator {
        IdAllocator::new("ITEMS_COUNT").unwrap()
    }

    #[test]
    fn test_next_id_after_last_define() {
        let allocation = allocator().next_id(HEADER).unwrap();
        assert_eq!(allocation.last_id, 0x1A3);
        assert_eq!(allocation.next_id, 0x1A4);
        assert!(HEADER[allocation.insertion_point..].starts_with("#define ITEMS_COUNT"));
    }

    #[test]
    fn test_commit_inserts_define_and_rewrites_count() {
        let allocator = allocator();
        let out = allocator.commit(HEADER, "ITEM_NEWNAME", 0x1A4).unwrap();
        assert!(out.contains(
            "#define ITEM_OLD_SEA_MAP 0x1A3\n\n#define ITEM_NEWNAME 0x1A4\n#define ITEMS_COUNT (ITEM_NEWNAME + 1)\n\n#endif"
        ));
        assert_eq!(allocator.next_id(&out).unwrap().next_id, 0x1A5);
    }

    #[test]
    fn test_missing_count_macro() {
        let err = allocator().next_id("#define ITEM_NONE 0x0\n").unwrap_err();
        match err {
            TextError::ParseAnchorNotFound { anchor, .. } => assert!(anchor.contains("ITEMS_COUNT")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_preceding_id() {
        let header = "#define ITEMS_COUNT (ITEM_NONE + 1)\n#define ITEM_LATE 0x5\n";
        let err = allocator().next_id(header).unwrap_err();
        assert!(matches!(err, TextError::ParseAnchorNotFound { .. }));
    }

    #[test]
    fn test_commit_rejects_existing_symbol() {
        let err = allocator().commit(HEADER, "ITEM_MASTER_BALL", 0x1A4).unwrap_err();
        assert!(matches!(err, TextError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_count_macro_prefix_is_not_confused() {
        let header = "#define ITEM_A 0x2\n#define ITEMS_COUNT_MAX 99\n#define ITEMS_COUNT (ITEM_A + 1)\n";
        let allocation = allocator().next_id(header).unwrap();
        assert_eq!(allocation.next_id, 3);
        assert!(header[allocation.insertion_point..].starts_with("#define ITEMS_COUNT ("));
    }
}
