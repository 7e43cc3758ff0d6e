//! Generate command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hydra_core::Builder;
use hydra_core::bundle::bundle_manifest;

use crate::ui::{Output, format_size};

/// Walk `dir` into a manifest and write it to `target` (`-` for stdout).
///
/// With `bundle`, the tree is also archived next to `target` and the
/// written manifest tracks only that archive.
pub fn generate(dir: &Path, target: &str, bundle: bool, output: &Output) -> Result<()> {
    let manifest = Builder::new()
        .build(dir)
        .with_context(|| format!("failed to generate manifest from {}", dir.display()))?;

    let manifest = if bundle {
        let out_dir = bundle_dir(target);
        bundle_manifest(&manifest, &out_dir, output)
            .with_context(|| format!("failed to bundle {}", dir.display()))?
    } else {
        manifest
    };

    manifest
        .write_to(target)
        .with_context(|| format!("failed to write manifest to {target}"))?;

    if target != "-" {
        output.success(&format!(
            "Wrote {target}: {} files, {}",
            manifest.file_count,
            format_size(manifest.total_size)
        ));
    }
    Ok(())
}

/// Directory the bundle lands in: beside the manifest, or the working
/// directory when the manifest goes to stdout.
fn bundle_dir(target: &str) -> PathBuf {
    if target == "-" || target.is_empty() {
        return PathBuf::from(".");
    }
    match Path::new(target).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_lands_beside_manifest() {
        assert_eq!(bundle_dir("-"), PathBuf::from("."));
        assert_eq!(bundle_dir("manifest.yaml"), PathBuf::from("."));
        assert_eq!(bundle_dir("out/app/manifest.yaml"), PathBuf::from("out/app"));
    }
}
