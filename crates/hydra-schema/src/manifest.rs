//! Manifest data model and its YAML envelope.
//!
//! The serialized form looks like:
//!
//! ```yaml
//! manifest:
//!   assets:
//!     - name: img/logo.png
//!       size: 2048
//!       sha256: 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//!       mime: image/png
//!   modules: []
//!   globals: [shared]
//!   generated_at: 2024-01-01T00:00:00Z
//!   size: 2048
//!   file_count: 1
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::MANIFEST_FILENAME;
use crate::hash::Sha256Hash;

/// Errors raised while reading or writing a manifest document.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path that was being accessed (`-` for standard output).
        path: String,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The document is not valid YAML or does not match the schema.
    #[error("malformed manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Whether a tracked file is consumed as-is or compiled further downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Static resource, consumed as-is.
    Asset,
    /// Module definition, parsed by the code-generation collaborator.
    Module,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Asset => f.write_str("asset"),
            EntryKind::Module => f.write_str("module"),
        }
    }
}

/// An entry name that does not stay beneath the manifest root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsafe entry name '{name}': {reason}")]
pub struct EntryNameError {
    /// The rejected name.
    pub name: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

/// Check that `name` is a relative path made only of normal components and
/// return it as a path.
///
/// `.` segments are dropped. Empty names, absolute or drive-prefixed paths
/// and `..` segments are rejected.
///
/// # Errors
///
/// Returns [`EntryNameError`] describing the first offending part.
pub fn check_entry_name(name: &str) -> Result<PathBuf, EntryNameError> {
    let reject = |reason| EntryNameError {
        name: name.to_string(),
        reason,
    };

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(reject("absolute path"));
    }

    let mut rel = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(reject("parent directory segment")),
            Component::RootDir | Component::Prefix(_) => return Err(reject("absolute path")),
        }
    }

    if rel.as_os_str().is_empty() {
        return Err(reject("empty name"));
    }
    Ok(rel)
}

fn entry_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    check_entry_name(&name).map_err(serde::de::Error::custom)?;
    Ok(name)
}

// `skip_serializing_if` hands over a reference.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// One tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the manifest root, `/`-separated. Checked with
    /// [`check_entry_name`] on load.
    #[serde(deserialize_with = "entry_name")]
    pub name: String,
    /// Byte length of the content at record time.
    pub size: u64,
    /// SHA-256 of the content.
    #[serde(rename = "sha256")]
    pub hash: Sha256Hash,
    /// Detected content type; informational only.
    #[serde(default)]
    pub mime: String,
    /// True when the file is a supported archive that is expanded on fetch.
    #[serde(default, skip_serializing_if = "is_false")]
    pub archive: bool,
    /// Number of files packed inside this archive, when it is a bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_file_count: Option<u64>,
    /// Total size of the files packed inside this archive, when it is a bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_size: Option<u64>,
}

impl ManifestEntry {
    /// Create an entry with no bundle metadata.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        hash: Sha256Hash,
        mime: impl Into<String>,
        archive: bool,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            hash,
            mime: mime.into(),
            archive,
            archive_file_count: None,
            uncompressed_size: None,
        }
    }

    /// Location of this entry beneath `root`.
    ///
    /// # Errors
    ///
    /// Returns [`EntryNameError`] if the name would resolve outside `root`.
    pub fn path_in(&self, root: &Path) -> Result<PathBuf, EntryNameError> {
        Ok(root.join(check_entry_name(&self.name)?))
    }
}

/// The authoritative record of an application tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Files consumed as-is.
    #[serde(default)]
    pub assets: Vec<ManifestEntry>,
    /// Files compiled by the downstream code generator.
    #[serde(default)]
    pub modules: Vec<ManifestEntry>,
    /// Directories registered as global import paths, sorted.
    #[serde(rename = "globals", default)]
    pub global_imports: Vec<String>,
    /// Set once, when a build completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Sum of `size` over all entries.
    #[serde(rename = "size", default)]
    pub total_size: u64,
    /// Number of entries across assets and modules.
    #[serde(default)]
    pub file_count: u64,
    #[serde(skip)]
    root_dir: Option<PathBuf>,
}

/// Envelope the manifest is persisted in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    /// The wrapped manifest.
    pub manifest: Manifest,
}

impl Manifest {
    /// An empty manifest bound to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root.into()),
            ..Self::default()
        }
    }

    /// Bind the runtime-only root directory entries are relative to.
    pub fn bind_root(&mut self, root: impl Into<PathBuf>) {
        self.root_dir = Some(root.into());
    }

    /// The bound root directory, if any.
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// All entries, assets first and then modules.
    pub fn files(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.assets.iter().chain(self.modules.iter())
    }

    /// Look up an entry by its relative name.
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.files().find(|e| e.name == name)
    }

    /// Append an entry to the collection for `kind`, keeping the
    /// aggregates in step.
    pub fn append(&mut self, kind: EntryKind, entry: ManifestEntry) {
        self.file_count += 1;
        self.total_size += entry.size;

        match kind {
            EntryKind::Asset => self.assets.push(entry),
            EntryKind::Module => self.modules.push(entry),
        }
    }

    /// Register a global import directory. Returns `false` if it was
    /// already present.
    pub fn add_global_import(&mut self, dir: impl Into<String>) -> bool {
        let dir = dir.into();
        if self.global_imports.contains(&dir) {
            return false;
        }
        self.global_imports.push(dir);
        true
    }

    /// Stamp the build time and put the import list in canonical order.
    pub fn finalize(&mut self, generated_at: DateTime<Utc>) {
        self.generated_at = Some(generated_at);
        self.global_imports.sort();
        self.global_imports.dedup();
    }

    /// Whether `entry` is a `.qml` file generated from a tracked `.yaml`
    /// module of the same stem.
    pub fn is_autogenerated(&self, entry: &ManifestEntry) -> bool {
        let Some(stem) = entry.name.strip_suffix(".qml") else {
            return false;
        };
        let source = format!("{stem}.yaml");
        self.modules.iter().any(|m| m.name == source)
    }

    /// Parse a manifest from its YAML envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Yaml`] if the document is malformed.
    pub fn from_yaml_str(s: &str) -> Result<Self, ManifestError> {
        let app: Application = serde_yaml::from_str(s)?;
        Ok(app.manifest)
    }

    /// Render this manifest inside its YAML envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Yaml`] if serialization fails.
    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(&Envelope { manifest: self })?)
    }

    /// Load a manifest from a file. The root directory is left unbound.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Write this manifest to `target`.
    ///
    /// `-` writes to standard output; an empty target writes to
    /// [`MANIFEST_FILENAME`] in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be created or written.
    pub fn write_to(&self, target: &str) -> Result<(), ManifestError> {
        let target = if target.is_empty() {
            MANIFEST_FILENAME
        } else {
            target
        };

        let io_err = |source| ManifestError::Io {
            path: target.to_string(),
            source,
        };

        if target == "-" {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            self.write_yaml(&mut lock)?;
            lock.flush().map_err(io_err)
        } else {
            let file = File::create(target).map_err(io_err)?;
            let mut writer = BufWriter::new(file);
            self.write_yaml(&mut writer)?;
            writer.flush().map_err(io_err)
        }
    }

    fn write_yaml<W: Write>(&self, w: W) -> Result<(), ManifestError> {
        serde_yaml::to_writer(w, &Envelope { manifest: self })?;
        Ok(())
    }
}

// Borrowing twin of `Application` so writing never clones the manifest.
#[derive(Serialize)]
struct Envelope<'a> {
    manifest: &'a Manifest,
}
