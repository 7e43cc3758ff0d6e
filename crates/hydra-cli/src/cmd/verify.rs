//! Verify command

use std::path::Path;

use anyhow::{Result, bail};
use hydra_core::validate;

use super::load_manifest;
use crate::ui::Output;

/// Report every entry that is missing or does not match under `dest`.
pub fn verify(manifest_path: &Path, dest: &Path, json: bool, output: &Output) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let problems = validate::verify(&manifest, dest);

    if json {
        println!("{}", serde_json::to_string_pretty(&problems)?);
    } else {
        for problem in &problems {
            output.error(&problem.reason);
        }
    }

    if !problems.is_empty() {
        bail!(
            "{} of {} files in {} are invalid",
            problems.len(),
            manifest.file_count,
            dest.display()
        );
    }

    output.success(&format!("{} files valid", manifest.file_count));
    Ok(())
}
