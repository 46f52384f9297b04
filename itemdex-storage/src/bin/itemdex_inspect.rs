/// Item Database Inspector - Shows what the repository sees in a decomp tree
///
/// Usage: cargo run --bin itemdex-inspect <decomp-root> [name-filter] [field]
///
/// Set ITEMDEX_LAYOUT to a layout TOML file to override the standard paths,
/// and RUST_LOG to control log output (defaults to `warn`).

use itemdex_core::{FieldKey, RepositoryLayout};
use itemdex_storage::RecordRepository;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin itemdex-inspect <decomp-root> [name-filter] [field]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin itemdex-inspect ~/decomps/firered potion");
        eprintln!("  cargo run --bin itemdex-inspect ~/decomps/firered \"\" price");
        std::process::exit(1);
    }

    let root = PathBuf::from(&args[1]);
    let filter = args.get(2).map(String::as_str).unwrap_or("");
    let only_field = match args.get(3) {
        Some(raw) => match FieldKey::parse(raw) {
            Some(key) => Some(key),
            None => {
                eprintln!("❌ Unknown field: {}", raw);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let layout = match std::env::var_os("ITEMDEX_LAYOUT") {
        Some(path) => match RepositoryLayout::from_path(&PathBuf::from(path)) {
            Ok(layout) => layout,
            Err(e) => {
                eprintln!("❌ Failed to load layout: {}", e);
                std::process::exit(1);
            }
        },
        None => RepositoryLayout::standard(),
    };

    let repo = match RecordRepository::load(&root, layout) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", root.display(), e);
            std::process::exit(1);
        }
    };

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ ITEM DATABASE: {}", root.display());
    println!("╚═══════════════════════════════════════════════════════════════\n");

    println!("📊 SUMMARY:");
    println!("  records:        {}", repo.records().len());
    println!("  symbols:        {}", repo.symbols().len());
    println!("  read-only tags: {}", repo.symbols().read_only().count());
    println!("  descriptions:   {}", repo.descriptions().len());
    println!("  graphics rows:  {}", repo.graphics().len());
    println!();

    let matches = repo.search(filter);
    println!("📦 RECORDS ({} shown):", matches.len());
    for record in matches {
        let constant = record.constant.as_deref().unwrap_or("-");
        let icon = match repo.icon_path(record.id) {
            Some(_) => "🖼",
            None => " ",
        };
        let name = match record.constant_title() {
            Some(title) if record.name.is_empty() => title,
            _ => record.name.clone(),
        };
        println!("  {} {:<16} {:<14} {}", icon, record.id_label(), name, constant);

        if let Some(key) = only_field {
            println!("        {:<14} {}", key.label(), record.field(key));
        } else if !filter.is_empty() {
            for (key, value) in record.fields().filter(|(_, v)| !v.is_empty()) {
                println!("        {:<14} {}", key.label(), value);
            }
            if let Ok(view) = repo.description(record.id) {
                if !view.tag.is_empty() {
                    let lock = if view.read_only { "🔒" } else { "✏" };
                    println!("        {:<14} {} {}", FieldKey::DescTag.label(), lock, view.text.replace('\n', " / "));
                }
            }
        }
    }
}
