//! Manifest generation from a source tree.
//!
//! The walk is depth-first in file-name order so two builds of the same
//! tree list their entries identically. Every regular file is either:
//!
//! | File | Disposition |
//! |---|---|
//! | `manifest.yaml` at the root | skipped |
//! | `qmldir`, `Hydra.qml` | skipped (structural) |
//! | `module.yaml` | parsed; a `global` spec adds its directory to the imports |
//! | anything the classifier accepts | appended to `modules` |
//! | everything else | appended to `assets` |

use std::path::{Component, Path};

use chrono::Utc;
use hydra_schema::{EntryKind, MANIFEST_FILENAME, Manifest, ManifestEntry};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::hashing::{detect_mime, sha256_file};
use crate::io::extract::ArchiveFormat;
use crate::module::{
    DefaultModules, MODULE_SPEC_FILENAME, ModuleClassifier, ModuleSpecError, ModuleSpecParser,
    is_structural,
};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("create-manifest: walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("create-manifest: {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("create-manifest: invalid module spec {path}: {source}")]
    ModuleSpec {
        path: String,
        source: ModuleSpecError,
    },
}

/// Walks a source tree into a [`Manifest`].
pub struct Builder {
    classifier: Box<dyn ModuleClassifier>,
    spec_parser: Box<dyn ModuleSpecParser>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder").finish_non_exhaustive()
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder using the [`DefaultModules`] rules.
    pub fn new() -> Self {
        Self {
            classifier: Box::new(DefaultModules),
            spec_parser: Box::new(DefaultModules),
        }
    }

    /// Replace the module classification predicate.
    pub fn with_classifier(mut self, classifier: impl ModuleClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the module spec parser.
    pub fn with_spec_parser(mut self, parser: impl ModuleSpecParser + 'static) -> Self {
        self.spec_parser = Box::new(parser);
        self
    }

    /// Generate a manifest from every file beneath `source_dir`.
    ///
    /// # Errors
    ///
    /// Any I/O failure or malformed module spec aborts the walk. The
    /// partially populated manifest is discarded.
    pub fn build(&self, source_dir: &Path) -> Result<Manifest, BuildError> {
        info!("generating manifest recursively from path: {}", source_dir.display());
        let mut manifest = Manifest::with_root(source_dir);

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            self.append(&mut manifest, entry.path())?;
        }

        manifest.finalize(Utc::now());
        for import in &manifest.global_imports {
            debug!("create-manifest: global import: {import}");
        }

        info!(
            "create-manifest: {} files ({} bytes), {} global imports",
            manifest.file_count,
            manifest.total_size,
            manifest.global_imports.len()
        );
        Ok(manifest)
    }

    /// Consider a single file for inclusion in `manifest`, relative to the
    /// manifest's bound root.
    ///
    /// Returns the collection the file was appended to, or `None` if it was
    /// consumed as a structural marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or, for module specs,
    /// parsed.
    pub fn append(
        &self,
        manifest: &mut Manifest,
        path: &Path,
    ) -> Result<Option<EntryKind>, BuildError> {
        let rel = relative_name(manifest.root_dir(), path);
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if base == MODULE_SPEC_FILENAME {
            let spec = self
                .spec_parser
                .parse(path)
                .map_err(|source| BuildError::ModuleSpec {
                    path: path.display().to_string(),
                    source,
                })?;
            if spec.global {
                let dir = match rel.rsplit_once('/') {
                    Some((dir, _)) => dir.to_string(),
                    None => ".".to_string(),
                };
                manifest.add_global_import(dir);
            }
            return Ok(None);
        }

        if rel == MANIFEST_FILENAME || is_structural(&base) {
            return Ok(None);
        }

        let io_err = |source| BuildError::Io {
            path: path.display().to_string(),
            source,
        };
        let size = std::fs::metadata(path).map_err(io_err)?.len();
        let hash = sha256_file(path).map_err(io_err)?;
        let entry = ManifestEntry::new(
            rel,
            size,
            hash,
            detect_mime(path),
            ArchiveFormat::detect(path).is_some(),
        );

        let kind = if self.classifier.is_module(path) {
            debug!("create-manifest: add module: {} ({size} bytes)", entry.name);
            EntryKind::Module
        } else {
            debug!("create-manifest:  add asset: {} ({size} bytes)", entry.name);
            EntryKind::Asset
        };

        manifest.append(kind, entry);
        Ok(Some(kind))
    }
}

/// `path` relative to `root` as a `/`-separated name; falls back to the
/// path itself when it is not beneath `root`.
fn relative_name(root: Option<&Path>, path: &Path) -> String {
    let rel = root
        .and_then(|r| path.strip_prefix(r).ok())
        .unwrap_or(path);

    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
