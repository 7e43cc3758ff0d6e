//! Manifest tables for `hydra inspect`.

use comfy_table::{Cell, Color, Table};
use hydra_schema::{EntryKind, Manifest};

use super::theme::format_size;

/// One row per entry: kind, name, size, MIME type, short hash, archive flag.
pub fn manifest_table(manifest: &Manifest) -> Table {
    let mut table = Table::new();
    let _ = table.set_header(vec![
        Cell::new("Kind").fg(Color::Blue),
        Cell::new("Name").fg(Color::Blue),
        Cell::new("Size").fg(Color::Blue),
        Cell::new("MIME Type").fg(Color::Blue),
        Cell::new("SHA-256").fg(Color::Blue),
        Cell::new("Archive").fg(Color::Blue),
    ]);

    let rows = manifest
        .assets
        .iter()
        .map(|e| (EntryKind::Asset, e))
        .chain(manifest.modules.iter().map(|e| (EntryKind::Module, e)));

    for (kind, entry) in rows {
        let archive = match entry.archive_file_count {
            Some(n) => format!("yes ({n} files)"),
            None if entry.archive => "yes".to_string(),
            None => String::new(),
        };
        let _ = table.add_row(vec![
            Cell::new(kind),
            Cell::new(&entry.name),
            Cell::new(format_size(entry.size)),
            Cell::new(&entry.mime),
            Cell::new(entry.hash.short(12)),
            Cell::new(archive),
        ]);
    }
    table
}

/// Totals and global imports shown under the table.
pub fn manifest_footer(manifest: &Manifest) -> String {
    let mut footer = format!(
        "{} files, {}",
        manifest.file_count,
        format_size(manifest.total_size)
    );
    if let Some(at) = manifest.generated_at {
        footer.push_str(&format!(", generated {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if !manifest.global_imports.is_empty() {
        footer.push_str(&format!("\nglobal imports: {}", manifest.global_imports.join(", ")));
    }
    footer
}
