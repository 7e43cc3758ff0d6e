//! Checking tracked entries against the bytes on disk.

use std::io;
use std::path::Path;

use hydra_schema::{EntryNameError, Manifest, ManifestEntry, Sha256Hash};
use serde::Serialize;
use thiserror::Error;

use crate::hashing::sha256_file;

/// Why an entry does not match what is on disk.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{name}: no such file")]
    Missing { name: String },

    #[error("{name}: size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("{name}: checksum mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: Sha256Hash,
        actual: Sha256Hash,
    },

    #[error("{name}: {source}")]
    Io { name: String, source: io::Error },

    #[error(transparent)]
    UnsafeName(#[from] EntryNameError),
}

impl ValidationError {
    /// Relative name of the offending entry.
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::SizeMismatch { name, .. }
            | Self::HashMismatch { name, .. }
            | Self::Io { name, .. } => name,
            Self::UnsafeName(err) => &err.name,
        }
    }

    /// Missing and mismatched files can be repaired by fetching; I/O
    /// failures and names escaping the root cannot.
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::UnsafeName(_))
    }
}

/// Confirm that the file for `entry` under `root` has the recorded size and
/// hash.
///
/// # Errors
///
/// Returns the first discrepancy found.
pub fn validate_entry(entry: &ManifestEntry, root: &Path) -> Result<(), ValidationError> {
    let path = entry.path_in(root)?;

    let metadata = match std::fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return Err(ValidationError::Missing {
                name: entry.name.clone(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::Missing {
                name: entry.name.clone(),
            });
        }
        Err(source) => {
            return Err(ValidationError::Io {
                name: entry.name.clone(),
                source,
            });
        }
    };

    if metadata.len() != entry.size {
        return Err(ValidationError::SizeMismatch {
            name: entry.name.clone(),
            expected: entry.size,
            actual: metadata.len(),
        });
    }

    let actual = sha256_file(&path).map_err(|source| ValidationError::Io {
        name: entry.name.clone(),
        source,
    })?;

    if actual != entry.hash {
        return Err(ValidationError::HashMismatch {
            name: entry.name.clone(),
            expected: entry.hash.clone(),
            actual,
        });
    }

    Ok(())
}

/// A discrepancy reported by [`verify`].
#[derive(Debug, Clone, Serialize)]
pub struct Invalid {
    /// Relative name of the entry.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
}

impl From<ValidationError> for Invalid {
    fn from(err: ValidationError) -> Self {
        Self {
            name: err.name().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Check every entry of `manifest` under `root` without modifying anything,
/// collecting all discrepancies in manifest order.
pub fn verify(manifest: &Manifest, root: &Path) -> Vec<Invalid> {
    manifest
        .files()
        .filter_map(|entry| validate_entry(entry, root).err())
        .map(Invalid::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::sha256_bytes;
    use hydra_schema::EntryKind;
    use std::fs;

    fn entry(name: &str, data: &[u8]) -> ManifestEntry {
        ManifestEntry::new(name, data.len() as u64, sha256_bytes(data), "text/plain", false)
    }

    #[test]
    fn valid_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        assert!(validate_entry(&entry("a.txt", b"abc"), dir.path()).is_ok());
    }

    #[test]
    fn reports_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("size.txt"), b"abcd").unwrap();
        fs::write(dir.path().join("hash.txt"), b"abd").unwrap();
        fs::create_dir(dir.path().join("dir.txt")).unwrap();

        let missing = validate_entry(&entry("none.txt", b"abc"), dir.path()).unwrap_err();
        assert!(matches!(missing, ValidationError::Missing { .. }));
        assert!(missing.needs_fetch());

        let size = validate_entry(&entry("size.txt", b"abc"), dir.path()).unwrap_err();
        assert!(matches!(
            size,
            ValidationError::SizeMismatch {
                expected: 3,
                actual: 4,
                ..
            }
        ));

        let hash = validate_entry(&entry("hash.txt", b"abc"), dir.path()).unwrap_err();
        assert!(matches!(hash, ValidationError::HashMismatch { .. }));
        assert_eq!(hash.name(), "hash.txt");

        let dir_entry = validate_entry(&entry("dir.txt", b"abc"), dir.path()).unwrap_err();
        assert!(matches!(dir_entry, ValidationError::Missing { .. }));
    }

    #[test]
    fn escaping_name_is_fatal() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(base.path().join("outside.txt"), b"abc").unwrap();

        let err = validate_entry(&entry("../outside.txt", b"abc"), &root).unwrap_err();
        assert!(matches!(err, ValidationError::UnsafeName(_)));
        assert_eq!(err.name(), "../outside.txt");
        assert!(!err.needs_fetch());
    }

    #[test]
    fn verify_collects_all_problems_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.txt"), b"ok").unwrap();
        fs::write(dir.path().join("bad.txt"), b"bad!").unwrap();

        let mut manifest = Manifest::with_root(dir.path());
        manifest.append(EntryKind::Asset, entry("gone.txt", b"x"));
        manifest.append(EntryKind::Asset, entry("ok.txt", b"ok"));
        manifest.append(EntryKind::Module, entry("bad.txt", b"good"));

        let problems = verify(&manifest, dir.path());
        let names: Vec<&str> = problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["gone.txt", "bad.txt"]);
        assert!(problems[1].reason.contains("checksum mismatch"));
    }
}
