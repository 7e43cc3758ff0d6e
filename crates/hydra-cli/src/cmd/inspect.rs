//! Inspect command

use std::path::Path;

use anyhow::Result;

use super::load_manifest;
use crate::ui::table::{manifest_footer, manifest_table};

/// Print a manifest's entries as a table.
pub fn inspect(manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;

    if manifest.file_count == 0 {
        println!("No files tracked");
    } else {
        println!("{}", manifest_table(&manifest));
    }
    println!("{}", manifest_footer(&manifest));
    Ok(())
}
