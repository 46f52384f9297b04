//! itemdex Test Utilities
//!
//! Centralized test infrastructure for the itemdex workspace:
//! - Proptest generators for names, token streams and record arrays
//! - On-disk decomp tree fixtures
//! - In-memory PNG generation for the icon contract
//! - Custom assertions for itemdex error variants

// Re-export core types for convenience
pub use itemdex_core::{
    AssetError, FieldKey, ItemdexError, ItemdexResult, NewRecord, Record, RepositoryLayout,
    TextError, ValidationError, ICON_DIMENSION, NAME_CAPACITY,
};

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// ============================================================================
// IMAGES
// ============================================================================

/// Encode a `width` x `height` RGBA checkerboard as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([0xF8, 0x30, 0x30, 0xFF])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding of an in-memory image should succeed");
    out.into_inner()
}

/// A PNG satisfying the icon contract.
pub fn valid_icon() -> Vec<u8> {
    png_bytes(ICON_DIMENSION, ICON_DIMENSION)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for itemdex inputs.

    use proptest::prelude::*;

    /// Names the glyph codec round-trips: supported characters, no
    /// surrounding spaces, at most 13 characters.
    pub fn arb_display_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9.!?'@-]([A-Za-z0-9 .!?'@-]{0,11}[A-Za-z0-9.!?'@-])?"
    }

    /// A single glyph token as it appears in a name array.
    pub fn arb_token() -> impl Strategy<Value = String> {
        prop_oneof![
            "_[A-Za-z0-9]".prop_map(String::from),
            Just("_SPACE".to_string()),
            Just("_PERIOD".to_string()),
            Just("_eACUTE".to_string()),
            Just("_END".to_string()),
            "'[a-z{}]'".prop_map(String::from),
            Just("_PO".to_string()),
            Just("_KE".to_string()),
            Just("_BL".to_string()),
            Just("_OC".to_string()),
            Just("_OK".to_string()),
        ]
    }

    /// Comma-separated token stream of arbitrary length, sentinel anywhere.
    pub fn arb_token_stream() -> impl Strategy<Value = String> {
        prop::collection::vec(arb_token(), 0..40).prop_map(|tokens| tokens.join(", "))
    }

    /// Hand-formatted record array named `gItemData`, paired with the
    /// number of records it holds.
    pub fn arb_record_array() -> impl Strategy<Value = (String, usize)> {
        prop::collection::vec(
            (
                prop::collection::vec(arb_token(), 0..14),
                0u32..10_000,
                any::<bool>(),
                any::<bool>(),
            ),
            0..16,
        )
        .prop_map(|records| {
            let mut source = String::from("const struct Item gItemData[] =\n{\n");
            for (i, (tokens, price, compact, commented)) in records.iter().enumerate() {
                if *commented {
                    source.push_str("    /* { not a record } */\n");
                }
                if *compact {
                    source.push_str(&format!(
                        "    {{.name={{{}}},.price={}}},\n",
                        tokens.join(","),
                        price
                    ));
                } else {
                    source.push_str(&format!(
                        "    {{\n        .name = {{{}}},\n        .itemId = ITEM_{},\n        .price = {},\n    }},\n",
                        tokens.join(", "),
                        i,
                        price
                    ));
                }
            }
            source.push_str("};\n");
            (source, records.len())
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built decomp trees for repository tests.

    use super::*;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    pub const ID_HEADER: &str = "#ifndef GUARD_CONSTANTS_ITEMS_H
#define GUARD_CONSTANTS_ITEMS_H

#define ITEM_NONE 0x0
#define ITEM_MASTER_BALL 0x1
#define ITEM_POTION 0x2
#define ITEM_POKEBLOCK_CASE 0x3

#define ITEMS_COUNT (ITEM_POKEBLOCK_CASE + 1)

#endif  // GUARD_CONSTANTS_ITEMS_H
";

    pub const RECORD_TABLE: &str = "#include \"../../include/global.h\"
#include \"../../include/new/item_tables.h\"

const struct Item gItemData[] =
{
    {
        .name = {_QUESTION, _QUESTION, _QUESTION, _QUESTION, _END},
        .itemId = ITEM_NONE,
        .price = 0,
        .holdEffect = HOLD_EFFECT_NONE,
        .holdEffectParam = 0,
        .description = DESC_NONE,
        .importance = 0,
        .unk19 = 0,
        .pocket = POCKET_ITEMS,
        .type = 4,
        .fieldUseFunc = ItemUseOutOfBattle_CannotUse,
        .battleUsage = 0,
        .battleUseFunc = NULL,
        .secondaryId = 0,
    },
    {
        .name = {_M, _a, _s, _t, _e, _r, _SPACE, _B, _a, _l, _l, _END},
        .itemId = ITEM_MASTER_BALL,
        .price = 0,
        .holdEffect = HOLD_EFFECT_NONE,
        .holdEffectParam = 0,
        .description = DESC_MASTER_BALL,
        .importance = 0,
        .unk19 = 0,
        .pocket = POCKET_POKE_BALLS,
        .type = 0,
        .fieldUseFunc = ItemUseOutOfBattle_CannotUse,
        .battleUsage = 2,
        .battleUseFunc = ItemUseInBattle_PokeBall,
        .secondaryId = 0,
    },
    // Medicine
    {
        .name = {_P,_o,_t,_i,_o,_n,_END},
        .itemId = ITEM_POTION,
        .price = 300, // rebalanced
        .holdEffect = HOLD_EFFECT_NONE,
        .holdEffectParam = 20,
        .description = DESC_POTION,
        .importance = 0,
        .unk19 = 0,
        .pocket = POCKET_ITEMS,
        .type = 1,
        .fieldUseFunc = ItemUseOutOfBattle_Medicine,
        .battleUsage = 1,
        .battleUseFunc = ItemUseInBattle_Medicine,
        .secondaryId = 0,
    },
    {
        .name = {_PO, _KE, _BL, _OC, _OK, _SPACE, _C, _a, _s, _e, _END},
        .itemId = ITEM_POKEBLOCK_CASE,
        .price = 0,
        .holdEffect = HOLD_EFFECT_NONE,
        .holdEffectParam = 0,
        .description = DESC_POKEBLOCK_CASE,
        .importance = 1,
        .unk19 = 0,
        .pocket = POCKET_KEY_ITEMS,
        .type = 4,
        .fieldUseFunc = ItemUseOutOfBattle_PokeblockCase,
        .battleUsage = 0,
        .battleUseFunc = NULL,
        .secondaryId = 0,
    },
};

const u32* const gItemGraphicsTable[ITEMS_COUNT + 1][2] =
{
    {gItemIcon_QuestionMarkTiles, gItemIcon_QuestionMarkPalette},
    {gItemIcon_MasterBallTiles, gItemIcon_MasterBallPalette},
    {gItemIcon_PotionTiles, gItemIcon_PotionPalette},
    {gItemIcon_PokeblockCaseTiles, gItemIcon_PokeblockCasePalette},
};
";

    pub const TABLE_HEADER: &str = "#pragma once

#include \"../global.h\"

#define DESC_NONE ((const u8 *) 0x0841A000)
#define DESC_MASTER_BALL ((const u8 *) 0x0841A010)
extern const u8 DESC_POTION[];
extern const u8 DESC_POKEBLOCK_CASE[];

#define gItemIcon_QuestionMarkTiles ((u32*) 0x08DB7BC4)
#define gItemIcon_QuestionMarkPalette ((u32*) 0x08DB7CF4)
#define gItemIcon_MasterBallTiles ((u32*) 0x08DB7D1C)
#define gItemIcon_MasterBallPalette ((u32*) 0x08DB7E4C)
extern const u32 gItemIcon_PotionTiles[];
extern const u32 gItemIcon_PotionPalette[];
extern const u32 gItemIcon_PokeblockCaseTiles[];
extern const u32 gItemIcon_PokeblockCasePalette[];
";

    pub const DESCRIPTIONS: &str = "\u{feff}#org @DESC_MASTER_BALL
The best BALL that catches
a POKéMON without fail.

#org @DESC_POTION
Restores the HP of a
POKéMON by 20 points.

#org @DESC_POKEBLOCK_CASE
A case for holding
POKéBLOCKS.
";

    /// Base name of the one icon the fixture ships with.
    pub const POTION_ICON: &str = "gItemIcon_Potion";

    /// A complete decomp tree in a temporary directory, laid out per
    /// [`RepositoryLayout::standard`].
    pub struct DecompTree {
        dir: TempDir,
        layout: RepositoryLayout,
    }

    impl DecompTree {
        pub fn new() -> Self {
            let dir = TempDir::new().expect("TempDir creation should succeed");
            let tree = Self {
                dir,
                layout: RepositoryLayout::standard(),
            };
            tree.write(&tree.layout.id_header, ID_HEADER);
            tree.write(&tree.layout.record_table, RECORD_TABLE);
            tree.write(&tree.layout.table_header, TABLE_HEADER);
            tree.write(&tree.layout.descriptions, DESCRIPTIONS);
            let icon = tree.layout.icon_dir.join(format!("{}.png", POTION_ICON));
            tree.write_bytes(&icon, &valid_icon());
            tree
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn layout(&self) -> &RepositoryLayout {
            &self.layout
        }

        pub fn path(&self, relative: &Path) -> PathBuf {
            self.dir.path().join(relative)
        }

        pub fn write(&self, relative: &Path, contents: &str) {
            self.write_bytes(relative, contents.as_bytes());
        }

        pub fn write_bytes(&self, relative: &Path, contents: &[u8]) {
            let path = self.path(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("fixture directory creation should succeed");
            }
            std::fs::write(&path, contents).expect("fixture write should succeed");
        }

        pub fn read(&self, relative: &Path) -> String {
            std::fs::read_to_string(self.path(relative)).expect("fixture read should succeed")
        }

        pub fn remove(&self, relative: &Path) {
            std::fs::remove_file(self.path(relative)).expect("fixture removal should succeed");
        }

        pub fn id_header(&self) -> String {
            self.read(&self.layout.id_header)
        }

        pub fn record_table(&self) -> String {
            self.read(&self.layout.record_table)
        }

        pub fn table_header(&self) -> String {
            self.read(&self.layout.table_header)
        }

        pub fn descriptions(&self) -> String {
            self.read(&self.layout.descriptions)
        }

        pub fn icon(&self, base: &str) -> PathBuf {
            self.path(&self.layout.icon_dir.join(format!("{}.png", base)))
        }

        /// Every file under the root with its bytes, keyed by relative path.
        pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
            let mut files = BTreeMap::new();
            let mut pending = vec![self.dir.path().to_path_buf()];
            while let Some(dir) = pending.pop() {
                let entries = std::fs::read_dir(&dir).expect("fixture read_dir should succeed");
                for entry in entries {
                    let path = entry.expect("fixture dir entry should be readable").path();
                    if path.is_dir() {
                        pending.push(path);
                    } else {
                        let bytes = std::fs::read(&path).expect("fixture read should succeed");
                        let relative = path
                            .strip_prefix(self.dir.path())
                            .expect("fixture path should be under root")
                            .to_path_buf();
                        files.insert(relative, bytes);
                    }
                }
            }
            files
        }
    }

    impl Default for DecompTree {
        fn default() -> Self {
            Self::new()
        }
    }

    /// A new record with every required value filled in.
    pub fn super_potion() -> NewRecord {
        NewRecord::new("SUPER_POTION", "Super Potion", "Restores the HP of a\nPOKéMON by 50 points.")
            .with_field(FieldKey::Price, "700")
            .with_field(FieldKey::HoldEffect, "HOLD_EFFECT_NONE")
            .with_field(FieldKey::HoldParam, "50")
            .with_field(FieldKey::Pocket, "POCKET_ITEMS")
            .with_field(FieldKey::Type, "1")
            .with_field(FieldKey::FieldUseFunc, "ItemUseOutOfBattle_Medicine")
            .with_field(FieldKey::BattleUsage, "1")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on itemdex error variants.

    use super::*;

    /// Assert that a result is a text error.
    #[track_caller]
    pub fn assert_text_error<T: std::fmt::Debug>(result: &ItemdexResult<T>) {
        match result {
            Err(ItemdexError::Text(_)) => {}
            other => panic!("Expected Text error, got: {:?}", other),
        }
    }

    /// Assert that a result is an anchor error mentioning `anchor`.
    #[track_caller]
    pub fn assert_anchor_missing<T: std::fmt::Debug>(result: &ItemdexResult<T>, anchor: &str) {
        match result {
            Err(ItemdexError::Text(TextError::ParseAnchorNotFound { anchor: a, .. })) => {
                assert!(a.contains(anchor), "Anchor {:?} does not mention {:?}", a, anchor);
            }
            other => panic!("Expected ParseAnchorNotFound for {:?}, got: {:?}", anchor, other),
        }
    }

    /// Assert that a result is an icon dimension mismatch.
    #[track_caller]
    pub fn assert_icon_rejected<T: std::fmt::Debug>(result: &ItemdexResult<T>) {
        match result {
            Err(ItemdexError::Asset(AssetError::IconDimensionMismatch { .. })) => {}
            other => panic!("Expected IconDimensionMismatch, got: {:?}", other),
        }
    }

    /// Assert that a result is a validation error naming `field`.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &ItemdexResult<T>, field: &str) {
        match result {
            Err(ItemdexError::Validation(ValidationError::RequiredFieldMissing { field: f }))
            | Err(ItemdexError::Validation(ValidationError::InvalidValue { field: f, .. })) => {
                assert_eq!(f, field, "Wrong field in validation error");
            }
            other => panic!("Expected Validation error for {}, got: {:?}", field, other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
