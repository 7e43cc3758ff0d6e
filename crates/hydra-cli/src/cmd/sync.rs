//! Sync command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use hydra_core::{FetchConfig, RetrieverRegistry, SyncOptions, Synchronizer};

use super::load_manifest;
use crate::ui::Output;

/// Reconcile `dest` against the manifest, fetching from `source`.
pub async fn sync(
    manifest_path: &Path,
    source: &str,
    dest: &Path,
    jobs: usize,
    output: &Output,
) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;

    let registry = RetrieverRegistry::with_defaults(&FetchConfig::from_env())
        .context("failed to initialize retrieval backends")?;
    let synchronizer = Synchronizer::new(registry)
        .with_options(SyncOptions { concurrency: jobs })
        .with_reporter(Arc::new(output.clone()));

    tokio::fs::create_dir_all(dest)
        .await
        .with_context(|| format!("failed to create {}", dest.display()))?;

    let report = synchronizer
        .reconcile(&manifest, source, dest)
        .await
        .with_context(|| format!("failed to sync {} from {source}", dest.display()))?;

    if report.fetch_count() == 0 {
        output.success(&format!(
            "{} is up to date ({} files)",
            dest.display(),
            report.entries().len()
        ));
    }
    Ok(())
}
