//! Reconciling a destination tree against a manifest.
//!
//! 1. Every entry (assets, then modules) is validated in place. Missing and
//!    mismatched files are queued for retrieval.
//! 2. Queued entries are retrieved from the source root in manifest order
//!    and written beneath the destination. Archive entries are expanded
//!    as soon as they land.
//! 3. Everything except the expanded archives is validated again. A file
//!    that still does not match is removed and the call fails.
//!
//! The first error from any entry aborts the whole call; files written
//! before it stay on disk.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use hydra_schema::{Manifest, ManifestEntry};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::io::extract::{ExtractError, extract_auto};
use crate::io::fetch::{ByteStream, FetchError, RetrieverRegistry};
use crate::reporter::{NullReporter, Reporter};
use crate::validate::{ValidationError, validate_entry};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{name}: retrieve: {source}")]
    Retrieve { name: String, source: FetchError },

    #[error("{name}: write: {source}")]
    Write { name: String, source: io::Error },

    #[error("{name}: extract: {source}")]
    Extract { name: String, source: ExtractError },

    #[error("invalid file: {0}")]
    Invalid(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What reconciliation did with one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Already present and matching; nothing was retrieved.
    Valid,
    /// Retrieved and written.
    Fetched,
    /// Retrieved and expanded into the tree; exempt from re-validation.
    Extracted,
}

/// Per-entry outcome of a reconciliation, in manifest order.
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    /// Relative name of the entry.
    pub name: String,
    /// What happened to it.
    pub status: EntryStatus,
}

/// Result of [`Synchronizer::reconcile`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    entries: Vec<EntryReport>,
}

impl SyncReport {
    /// All entries in manifest order.
    pub fn entries(&self) -> &[EntryReport] {
        &self.entries
    }

    /// Status of the entry called `name`.
    pub fn status(&self, name: &str) -> Option<EntryStatus> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.status)
    }

    /// Names of the entries that had to be retrieved.
    pub fn fetched(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status != EntryStatus::Valid)
            .map(|e| e.name.as_str())
    }

    /// Number of entries that had to be retrieved.
    pub fn fetch_count(&self) -> usize {
        self.fetched().count()
    }
}

/// Tuning for [`Synchronizer`].
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Maximum retrievals in flight. Results are still applied in manifest
    /// order and the first error wins.
    pub concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Makes a destination tree match a manifest.
pub struct Synchronizer {
    registry: RetrieverRegistry,
    options: SyncOptions,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Synchronizer {
    /// A synchronizer retrieving through `registry`, reporting nothing.
    pub fn new(registry: RetrieverRegistry) -> Self {
        Self {
            registry,
            options: SyncOptions::default(),
            reporter: Arc::new(NullReporter),
        }
    }

    /// Override the tuning options.
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Report progress to `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Ensure `dest_dir` holds hash-verified copies of every entry in
    /// `manifest`, retrieving from `source_root` only what is missing or
    /// invalid.
    ///
    /// # Errors
    ///
    /// Fails on the first retrieval, write or extraction error, or if any
    /// non-archive entry is still invalid once retrieval is done.
    pub async fn reconcile(
        &self,
        manifest: &Manifest,
        source_root: &str,
        dest_dir: &Path,
    ) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let entries: Arc<[ManifestEntry]> = manifest.files().cloned().collect();
        let mut statuses = vec![EntryStatus::Valid; entries.len()];

        self.reporter.section("Validating");
        let to_fetch = {
            let entries = Arc::clone(&entries);
            let dest = dest_dir.to_path_buf();
            blocking(move || find_invalid(&entries, &dest)).await??
        };

        if to_fetch.is_empty() {
            self.reporter
                .info(&format!("all {} files already valid", entries.len()));
        } else {
            let total: u64 = to_fetch.iter().map(|&i| entries[i].size).sum();
            info!(
                "fetching {} files ({total} bytes) into {}",
                to_fetch.len(),
                dest_dir.display()
            );
            self.reporter.section("Fetching");

            let mut results = futures::stream::iter(to_fetch)
                .map(|i| {
                    let entry = &entries[i];
                    async move {
                        self.fetch_entry(entry, source_root, dest_dir)
                            .await
                            .map(|status| (i, status))
                    }
                })
                .buffered(self.options.concurrency.max(1));

            while let Some(result) = results.next().await {
                let (i, status) = result?;
                statuses[i] = status;
            }
        }

        self.reporter.section("Verifying");
        let pending: Vec<usize> = statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != EntryStatus::Extracted)
            .map(|(i, _)| i)
            .collect();
        {
            let entries = Arc::clone(&entries);
            let dest = dest_dir.to_path_buf();
            blocking(move || confirm(&entries, &pending, &dest)).await??;
        }

        let report = SyncReport {
            entries: entries
                .iter()
                .zip(statuses)
                .map(|(e, status)| EntryReport {
                    name: e.name.clone(),
                    status,
                })
                .collect(),
        };

        self.reporter.summary(
            report.fetch_count(),
            "fetched",
            started.elapsed().as_secs_f64(),
        );
        Ok(report)
    }

    async fn fetch_entry(
        &self,
        entry: &ManifestEntry,
        source_root: &str,
        dest_dir: &Path,
    ) -> Result<EntryStatus, SyncError> {
        let result = self.retrieve(entry, source_root, dest_dir).await;
        if let Err(e) = &result {
            self.reporter.failed(&entry.name, &e.to_string());
        }
        result
    }

    async fn retrieve(
        &self,
        entry: &ManifestEntry,
        source_root: &str,
        dest_dir: &Path,
    ) -> Result<EntryStatus, SyncError> {
        let dest = entry.path_in(dest_dir).map_err(ValidationError::from)?;
        debug!("fetching file: {source_root}[{}]", dest.display());
        self.reporter.fetching(&entry.name, entry.size);

        let mut stream = self
            .registry
            .open(source_root, &entry.name)
            .await
            .map_err(|source| SyncError::Retrieve {
                name: entry.name.clone(),
                source,
            })?;

        write_stream(&mut stream, &dest)
            .await
            .map_err(|source| SyncError::Write {
                name: entry.name.clone(),
                source,
            })?;

        if !entry.archive {
            self.reporter.done(&entry.name, "fetched", Some(entry.size));
            return Ok(EntryStatus::Fetched);
        }

        self.reporter.extracting(&entry.name);
        let extract_err = |source| SyncError::Extract {
            name: entry.name.clone(),
            source,
        };
        let root = dest_dir.to_path_buf();
        let files = blocking(move || extract_auto(&dest, &root))
            .await
            .map_err(|e| extract_err(ExtractError::Io(e)))?
            .map_err(extract_err)?;

        debug!("extracted {} files from {}", files.len(), entry.name);
        self.reporter.done(
            &entry.name,
            &format!("extracted {} files", files.len()),
            Some(entry.size),
        );
        Ok(EntryStatus::Extracted)
    }
}

/// Remove module files from a destination tree. Returns how many were
/// removed; files that are already gone are ignored.
///
/// # Errors
///
/// Returns the first I/O error other than "not found", or
/// [`io::ErrorKind::InvalidInput`] for a module name that escapes `dest_dir`.
pub fn clean(manifest: &Manifest, dest_dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for module in &manifest.modules {
        let path = module
            .path_in(dest_dir)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

// Indices of entries that need fetching; stops on I/O errors that fetching
// cannot repair.
fn find_invalid(entries: &[ManifestEntry], dest: &Path) -> Result<Vec<usize>, ValidationError> {
    let mut out = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match validate_entry(entry, dest) {
            Ok(()) => {}
            Err(err) if err.needs_fetch() => {
                debug!("needs fetch: {err}");
                out.push(i);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}

fn confirm(entries: &[ManifestEntry], pending: &[usize], dest: &Path) -> Result<(), ValidationError> {
    for &i in pending {
        let entry = &entries[i];
        if let Err(err) = validate_entry(entry, dest) {
            let path = entry.path_in(dest)?;
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("could not remove invalid file {}: {e}", path.display());
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

async fn write_stream(stream: &mut ByteStream, dest: &Path) -> io::Result<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(dest).await?;
    let written = tokio::io::copy(stream, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)
}
