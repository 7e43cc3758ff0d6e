//! Bundle command

use std::path::Path;

use anyhow::{Context, Result};

use super::load_manifest;
use crate::ui::{Output, format_size};

/// Archive the files the manifest tracks under `root` into `archive`.
pub fn bundle(manifest_path: &Path, root: &Path, archive: &Path, output: &Output) -> Result<()> {
    let mut manifest = load_manifest(manifest_path)?;
    manifest.bind_root(root);

    let summary = hydra_core::bundle(&manifest, archive, output)
        .with_context(|| format!("failed to bundle {}", root.display()))?;

    output.success(&format!(
        "Wrote {}: {} files, {} ({} skipped)",
        summary.path.display(),
        summary.files,
        format_size(summary.bytes),
        summary.skipped
    ));
    Ok(())
}
