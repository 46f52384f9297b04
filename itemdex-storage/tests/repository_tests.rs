//! Repository integration tests against on-disk decomp trees.

use itemdex_core::{FieldKey, StorageKind, SymbolOrigin, ROM_PLACEHOLDER};
use itemdex_storage::RecordRepository;
use itemdex_test_utils::assertions::*;
use itemdex_test_utils::fixtures::{self, DecompTree};
use itemdex_test_utils::{png_bytes, valid_icon};
use itemdex_text::{extract_records, DescriptionChange};

fn open(tree: &DecompTree) -> RecordRepository {
    RecordRepository::load(tree.root(), tree.layout().clone()).expect("fixture should load")
}

fn record_spans(table: &str) -> Vec<String> {
    let (_, spans) = extract_records(table, "gItemData").expect("record array should exist");
    spans.iter().map(|s| s.text(table).to_string()).collect()
}

// ============================================================================
// LOAD
// ============================================================================

#[test]
fn test_load_decodes_records() {
    let tree = DecompTree::new();
    let repo = open(&tree);

    let names: Vec<&str> = repo.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["????", "Master Ball", "Potion", "Pokeblock Case"]);

    let potion = repo.record(2).unwrap();
    assert_eq!(potion.field(FieldKey::Price), "300");
    assert_eq!(potion.field(FieldKey::HoldParam), "20");
    assert_eq!(potion.desc_tag(), "DESC_POTION");
    assert_eq!(potion.constant.as_deref(), Some("ITEM_POTION"));
    assert_eq!(potion.id_label(), "ID: 2 / 0x02");
    assert_eq!(repo.graphics().len(), 4);
}

#[test]
fn test_load_descriptions_and_read_only_tags() {
    let tree = DecompTree::new();
    let repo = open(&tree);

    let none = repo.description(0).unwrap();
    assert_eq!(none.tag, "DESC_NONE");
    assert_eq!(none.text, ROM_PLACEHOLDER);
    assert!(none.read_only);

    let master = repo.description(1).unwrap();
    assert_eq!(master.text, "The best BALL that catches\na POKéMON without fail.");
    assert!(master.read_only);

    let potion = repo.description(2).unwrap();
    assert!(!potion.read_only);
    assert!(potion.text.starts_with("Restores the HP"));
}

#[test]
fn test_load_missing_record_table_degrades() {
    let tree = DecompTree::new();
    tree.remove(&tree.layout().record_table);
    let mut repo = open(&tree);
    assert!(repo.records().is_empty());
    assert_eq!(repo.save().unwrap(), 0);
}

#[test]
fn test_load_missing_description_file_keeps_rom_tags() {
    let tree = DecompTree::new();
    tree.remove(&tree.layout().descriptions);
    let repo = open(&tree);
    assert_eq!(repo.records().len(), 4);
    assert_eq!(repo.description(1).unwrap().text, ROM_PLACEHOLDER);
    assert_eq!(repo.description(2).unwrap().text, "");
}

#[test]
fn test_unknown_record() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    assert_text_error(&repo.apply_field_edit(99, FieldKey::Price, "1"));
    assert_text_error(&repo.description(99));
}

// ============================================================================
// EDIT + SAVE
// ============================================================================

#[test]
fn test_unedited_save_is_byte_identical() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);
    assert_eq!(repo.save().unwrap(), 1);
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_price_edit_touches_only_its_value() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    repo.apply_field_edit(2, FieldKey::Price, "250").unwrap();
    repo.save().unwrap();

    assert_eq!(
        tree.record_table(),
        fixtures::RECORD_TABLE.replace(".price = 300, // rebalanced", ".price = 250, // rebalanced")
    );
    assert_eq!(tree.table_header(), fixtures::TABLE_HEADER);
}

#[test]
fn test_each_edit_leaves_other_spans_identical() {
    let original = record_spans(fixtures::RECORD_TABLE);
    for target in 0..original.len() {
        let tree = DecompTree::new();
        let mut repo = open(&tree);
        repo.apply_field_edit(target, FieldKey::SecondaryId, "7").unwrap();
        repo.save().unwrap();

        let saved = record_spans(&tree.record_table());
        assert_eq!(saved.len(), original.len());
        for (i, (old, new)) in original.iter().zip(&saved).enumerate() {
            if i == target {
                assert!(new.contains(".secondaryId = 7,"));
            } else {
                assert_eq!(old, new, "record {} changed while editing {}", i, target);
            }
        }
    }
}

#[test]
fn test_name_edit_is_normalized() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    let stored = repo.apply_name_edit(2, "Hyper Potion Extra").unwrap();
    assert_eq!(stored, "Hyper Potion");
    repo.save().unwrap();

    let table = tree.record_table();
    assert!(table.contains(
        ".name = {_H, _y, _p, _e, _r, _SPACE, _P, _o, _t, _i, _o, _n, _END},"
    ));
    assert!(table.contains(".name = {_PO, _KE, _BL, _OC, _OK, _SPACE, _C, _a, _s, _e, _END},"));
    assert_eq!(open(&tree).record(2).unwrap().name, "Hyper Potion");
}

#[test]
fn test_field_edit_rejects_unknown_description_tag() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    assert_validation_error(
        &repo.apply_field_edit(2, FieldKey::DescTag, "DESC_DOES_NOT_EXIST"),
        "description",
    );
    repo.apply_field_edit(2, FieldKey::DescTag, "DESC_NONE").unwrap();
    assert_eq!(repo.record(2).unwrap().desc_tag(), "DESC_NONE");
}

#[test]
fn test_field_edit_rejects_separator_characters() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    assert_validation_error(&repo.apply_field_edit(2, FieldKey::Price, "1, 2"), "price");
}

#[test]
fn test_read_only_description_promotes_once() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);

    let change = repo.apply_description_edit(1, "Never misses.").unwrap();
    assert_eq!(change, DescriptionChange::Promoted);
    assert!(!repo.description(1).unwrap().read_only);

    let change = repo.apply_description_edit(1, "Never, ever misses.").unwrap();
    assert_eq!(change, DescriptionChange::Stored);

    assert_eq!(repo.save().unwrap(), 3);
    let header = tree.table_header();
    assert!(header.contains("\nextern const u8 DESC_MASTER_BALL[];\n"));
    assert!(!header.contains("0x0841A010"));
    assert!(header.contains("#define DESC_NONE ((const u8 *) 0x0841A000)"));
    assert!(tree
        .descriptions()
        .contains("#org @DESC_MASTER_BALL\nNever, ever misses.\n"));

    let reloaded = open(&tree);
    assert!(!reloaded.description(1).unwrap().read_only);
    assert_eq!(reloaded.description(1).unwrap().text, "Never, ever misses.");
}

#[test]
fn test_unchanged_read_only_description_is_noop() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);

    let text = repo.description(1).unwrap().text.into_owned();
    assert_eq!(repo.apply_description_edit(1, &text).unwrap(), DescriptionChange::Unchanged);
    assert_eq!(
        repo.apply_description_edit(0, ROM_PLACEHOLDER).unwrap(),
        DescriptionChange::Unchanged
    );
    assert_eq!(repo.save().unwrap(), 1);
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_nested_anchored_literal_stays_inside_its_record() {
    let tree = DecompTree::new();
    let table = fixtures::RECORD_TABLE.replacen(
        "        .importance = 0,\n        .unk19 = 0,\n        .pocket = POCKET_ITEMS,\n        .type = 1,",
        "        .importance = 0,\n        .bundle = { .name = {_B, _END}, },\n        .unk19 = 0,\n        .pocket = POCKET_ITEMS,\n        .type = 1,",
        1,
    );
    assert_ne!(table, fixtures::RECORD_TABLE);
    tree.write(&tree.layout().record_table, &table);

    let mut repo = open(&tree);
    let names: Vec<&str> = repo.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["????", "Master Ball", "Potion", "Pokeblock Case"]);
    assert_eq!(repo.graphics().lookup_icon(3), Some("gItemIcon_PokeblockCase"));

    repo.apply_field_edit(3, FieldKey::Price, "5").unwrap();
    repo.save().unwrap();
    assert_eq!(
        tree.record_table(),
        table.replacen(
            "        .price = 0,\n        .holdEffect = HOLD_EFFECT_NONE,\n        .holdEffectParam = 0,\n        .description = DESC_POKEBLOCK_CASE,",
            "        .price = 5,\n        .holdEffect = HOLD_EFFECT_NONE,\n        .holdEffectParam = 0,\n        .description = DESC_POKEBLOCK_CASE,",
            1,
        )
    );
}

#[cfg(unix)]
#[test]
fn test_save_keeps_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let tree = DecompTree::new();
    let table = tree.path(&tree.layout().record_table);
    std::fs::set_permissions(&table, std::fs::Permissions::from_mode(0o644)).unwrap();

    let mut repo = open(&tree);
    repo.apply_field_edit(2, FieldKey::Price, "250").unwrap();
    repo.save().unwrap();

    let mode = std::fs::metadata(&table).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}

// ============================================================================
// ADD RECORD
// ============================================================================

#[test]
fn test_add_record_updates_all_five_files() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);

    let id = repo.add_record(&fixtures::super_potion(), &valid_icon()).unwrap();
    assert_eq!(id, 4);

    let header = tree.id_header();
    assert!(header.contains(
        "#define ITEM_POKEBLOCK_CASE 0x3\n\n#define ITEM_SUPER_POTION 0x4\n#define ITEMS_COUNT (ITEM_SUPER_POTION + 1)\n"
    ));

    let table_header = tree.table_header();
    for declaration in [
        "extern const u32 gItemIcon_SuperPotionTiles[];",
        "extern const u32 gItemIcon_SuperPotionPalette[];",
        "extern const u8 DESC_SUPER_POTION[];",
    ] {
        assert!(table_header.contains(declaration), "missing {}", declaration);
    }
    for name in ["gItemIcon_SuperPotionTiles", "gItemIcon_SuperPotionPalette", "DESC_SUPER_POTION"] {
        let symbol = repo.symbols().get(name).unwrap();
        assert_eq!(symbol.kind, StorageKind::ExternalDeclaration);
        assert_eq!(symbol.origin, SymbolOrigin::IntroducedByTool);
    }

    assert!(tree
        .descriptions()
        .ends_with("#org @DESC_SUPER_POTION\nRestores the HP of a\nPOKéMON by 50 points.\n"));

    let table = tree.record_table();
    assert!(table.contains(
        "    {gItemIcon_PokeblockCaseTiles, gItemIcon_PokeblockCasePalette},\n    {gItemIcon_SuperPotionTiles, gItemIcon_SuperPotionPalette},\n};"
    ));
    let spans = record_spans(&table);
    assert_eq!(spans.len(), 5);
    assert!(spans[4].contains(".itemId = ITEM_SUPER_POTION,"));
    assert!(spans[4].contains(".description = DESC_SUPER_POTION,"));
    assert_eq!(&spans[..4], &record_spans(fixtures::RECORD_TABLE)[..]);

    assert!(tree.icon("gItemIcon_SuperPotion").is_file());
    assert_eq!(tree.snapshot().len(), before.len() + 1);

    let added = repo.record(4).unwrap();
    assert_eq!(added.name, "Super Potion");
    assert_eq!(added.field(FieldKey::Price), "700");
    assert_eq!(repo.graphics().lookup_icon(4), Some("gItemIcon_SuperPotion"));
    assert!(repo.icon_path(4).is_some());

    let reloaded = open(&tree);
    assert_eq!(reloaded.records().len(), 5);
    assert_eq!(reloaded.record(4).unwrap().name, "Super Potion");
    assert_eq!(
        reloaded.description(4).unwrap().text,
        "Restores the HP of a\nPOKéMON by 50 points."
    );
}

#[test]
fn test_add_record_twice_allocates_sequentially() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    repo.add_record(&fixtures::super_potion(), &valid_icon()).unwrap();

    let mut hyper = fixtures::super_potion();
    hyper.stem = "HYPER_POTION".to_string();
    hyper.name = "Hyper Potion".to_string();
    assert_eq!(repo.add_record(&hyper, &valid_icon()).unwrap(), 5);

    let header = tree.id_header();
    assert!(header.contains("#define ITEM_HYPER_POTION 0x5\n#define ITEMS_COUNT (ITEM_HYPER_POTION + 1)"));
    assert_eq!(open(&tree).records().len(), 6);
}

#[test]
fn test_add_record_wrong_icon_size_changes_nothing() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);

    assert_icon_rejected(&repo.add_record(&fixtures::super_potion(), &png_bytes(32, 32)));
    assert_eq!(tree.snapshot(), before);
    assert_eq!(repo.records().len(), 4);
}

#[test]
fn test_add_record_missing_field_changes_nothing() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);

    let incomplete = fixtures::super_potion().with_field(FieldKey::Pocket, "");
    assert_validation_error(&repo.add_record(&incomplete, &valid_icon()), "pocket");
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_add_record_missing_count_macro_changes_nothing() {
    let tree = DecompTree::new();
    tree.write(
        &tree.layout().id_header,
        &fixtures::ID_HEADER.replace("#define ITEMS_COUNT (ITEM_POKEBLOCK_CASE + 1)\n", ""),
    );
    let before = tree.snapshot();
    let mut repo = open(&tree);

    assert_anchor_missing(&repo.add_record(&fixtures::super_potion(), &valid_icon()), "ITEMS_COUNT");
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_add_record_missing_graphics_table_changes_nothing() {
    let tree = DecompTree::new();
    let table = fixtures::RECORD_TABLE;
    let cut = table.find("const u32* const gItemGraphicsTable").unwrap();
    tree.write(&tree.layout().record_table, &table[..cut]);
    let before = tree.snapshot();
    let mut repo = open(&tree);
    assert_eq!(repo.records().len(), 4);

    assert_anchor_missing(
        &repo.add_record(&fixtures::super_potion(), &valid_icon()),
        "gItemGraphicsTable",
    );
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_add_record_duplicate_stem_changes_nothing() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);

    let mut duplicate = fixtures::super_potion();
    duplicate.stem = "POTION".to_string();
    assert_text_error(&repo.add_record(&duplicate, &valid_icon()));
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_add_record_flushes_pending_edits() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    repo.apply_field_edit(2, FieldKey::Price, "250").unwrap();
    repo.apply_description_edit(1, "Never misses.").unwrap();
    repo.add_record(&fixtures::super_potion(), &valid_icon()).unwrap();

    assert!(tree.record_table().contains(".price = 250, // rebalanced"));
    assert!(tree.table_header().contains("extern const u8 DESC_MASTER_BALL[];"));
    assert!(tree.descriptions().contains("#org @DESC_MASTER_BALL\nNever misses.\n"));
    assert_eq!(repo.record(2).unwrap().field(FieldKey::Price), "250");
}

// ============================================================================
// ICONS / SEARCH
// ============================================================================

#[test]
fn test_icon_lookup() {
    let tree = DecompTree::new();
    let repo = open(&tree);
    assert_eq!(repo.icon_path(2), Some(tree.icon(fixtures::POTION_ICON)));
    assert!(repo.icon_bytes(2).unwrap().is_some());
    assert_eq!(repo.icon_path(1), None);
    assert!(repo.icon_bytes(1).unwrap().is_none());
}

#[test]
fn test_import_icon_promotes_graphics_symbols() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);

    let path = repo.import_icon(1, &valid_icon()).unwrap();
    assert_eq!(path, tree.icon("gItemIcon_MasterBall"));
    assert!(path.is_file());

    let header = tree.table_header();
    assert!(header.contains("\nextern const u32 gItemIcon_MasterBallTiles[];\n"));
    assert!(header.contains("\nextern const u32 gItemIcon_MasterBallPalette[];\n"));
    assert!(header.contains("#define gItemIcon_QuestionMarkTiles ((u32*) 0x08DB7BC4)"));
    assert_eq!(repo.icon_path(1), Some(path));
}

#[test]
fn test_import_icon_wrong_size_writes_nothing() {
    let tree = DecompTree::new();
    let before = tree.snapshot();
    let mut repo = open(&tree);
    assert_icon_rejected(&repo.import_icon(1, &png_bytes(24, 25)));
    assert_eq!(tree.snapshot(), before);
}

#[test]
fn test_import_icon_for_external_symbols_only_writes_icon() {
    let tree = DecompTree::new();
    let mut repo = open(&tree);
    repo.import_icon(2, &valid_icon()).unwrap();
    assert_eq!(tree.table_header(), fixtures::TABLE_HEADER);
}

#[test]
fn test_search_is_case_insensitive_and_ordered() {
    let tree = DecompTree::new();
    let repo = open(&tree);

    let ids = |query: &str| -> Vec<usize> { repo.search(query).iter().map(|r| r.id).collect() };
    assert_eq!(ids("ball"), vec![1]);
    assert_eq!(ids("CASE"), vec![3]);
    assert_eq!(ids("o"), vec![2, 3]);
    assert_eq!(ids(""), vec![0, 1, 2, 3]);
    assert!(ids("zzz").is_empty());
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod prop_tests {
    use super::*;
    use itemdex_test_utils::generators::arb_display_name;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Search returns exactly the matching records, in ordinal order.
        #[test]
        fn prop_search_filters_by_name(query in "[a-zA-Z?]{0,3}") {
            let tree = DecompTree::new();
            let repo = open(&tree);
            let needle = query.to_lowercase();

            let found: Vec<usize> = repo.search(&query).iter().map(|r| r.id).collect();
            let expected: Vec<usize> = repo
                .records()
                .iter()
                .filter(|r| r.name.to_lowercase().contains(&needle))
                .map(|r| r.id)
                .collect();
            prop_assert_eq!(found, expected);
        }

        /// A saved name edit reloads as the name the edit reported.
        #[test]
        fn prop_name_edit_survives_reload(name in arb_display_name(), target in 0usize..4) {
            let tree = DecompTree::new();
            let mut repo = open(&tree);
            let stored = repo.apply_name_edit(target, &name).unwrap();
            prop_assert_eq!(&stored, &name);
            repo.save().unwrap();

            let reloaded = open(&tree);
            prop_assert_eq!(&reloaded.record(target).unwrap().name, &name);
            for other in (0..4).filter(|i| *i != target) {
                prop_assert_eq!(&reloaded.record(other).unwrap().name, &repo.record(other).unwrap().name);
            }
        }
    }
}
