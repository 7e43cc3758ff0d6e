//! Clean command

use std::path::Path;

use anyhow::{Context, Result};
use hydra_core::sync;

use super::load_manifest;
use crate::ui::Output;

/// Remove the manifest's module files from `dest`.
pub fn clean(manifest_path: &Path, dest: &Path, output: &Output) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let removed = sync::clean(&manifest, dest)
        .with_context(|| format!("failed to clean {}", dest.display()))?;

    output.success(&format!("Removed {removed} module files"));
    Ok(())
}
