//! Folding a validated tree into a single `.tar.gz`.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use hydra_schema::Manifest;
use thiserror::Error;
use tracing::{debug, info};

use crate::builder::{BuildError, Builder};
use crate::reporter::Reporter;
use crate::validate::{ValidationError, validate_entry};

/// File name of the archive produced by [`bundle_manifest`].
pub const BUNDLE_FILENAME: &str = "app.tar.gz";

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("bundle: manifest has no root directory")]
    NoRoot,

    #[error("bundle: invalid file: {0}")]
    Invalid(#[from] ValidationError),

    #[error("bundle: {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("bundle: {0}")]
    Build(#[from] BuildError),
}

/// What [`bundle`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Entries written into the archive.
    pub files: u64,
    /// Sum of their uncompressed sizes.
    pub bytes: u64,
    /// Entries left out as nested archives or generated derivatives.
    pub skipped: u64,
}

/// Write every tracked entry of `manifest` beneath its root into a gzip
/// compressed tar at `out_file`.
///
/// Archive entries and generated `X.qml` derivatives are skipped. Every
/// other entry is validated first; the archive is staged beside
/// `out_file` and only moved into place once complete.
///
/// # Errors
///
/// Fails if the manifest has no root, if any included entry no longer
/// matches its recorded size and hash, or on any I/O error.
pub fn bundle(
    manifest: &Manifest,
    out_file: &Path,
    reporter: &dyn Reporter,
) -> Result<BundleSummary, BundleError> {
    let root = manifest.root_dir().ok_or(BundleError::NoRoot)?;
    let out_err = |source| BundleError::Io {
        path: out_file.display().to_string(),
        source,
    };

    let parent = match out_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".hydra-bundle")
        .tempfile_in(parent)
        .map_err(out_err)?;

    info!("bundling {} into {}", root.display(), out_file.display());
    reporter.section("Bundling");

    let mut summary = BundleSummary {
        path: out_file.to_path_buf(),
        files: 0,
        bytes: 0,
        skipped: 0,
    };

    {
        let writer = BufWriter::new(staged.as_file_mut());
        let mut tar = tar::Builder::new(GzEncoder::new(writer, Compression::default()));

        for entry in manifest.files() {
            if entry.archive || manifest.is_autogenerated(entry) {
                debug!("bundle: skipping {}", entry.name);
                summary.skipped += 1;
                continue;
            }

            reporter.bundling(&entry.name, entry.size);
            if let Err(err) = validate_entry(entry, root) {
                reporter.failed(&entry.name, &err.to_string());
                return Err(err.into());
            }

            let path = entry.path_in(root).map_err(ValidationError::from)?;
            tar.append_path_with_name(&path, &entry.name)
                .map_err(|source| BundleError::Io {
                    path: path.display().to_string(),
                    source,
                })?;

            reporter.done(&entry.name, "added", Some(entry.size));
            summary.files += 1;
            summary.bytes += entry.size;
        }

        let mut writer = tar
            .into_inner()
            .and_then(GzEncoder::finish)
            .map_err(out_err)?;
        writer.flush().map_err(out_err)?;
    }

    if summary.files == 0 {
        reporter.warning("bundle contains no files");
    }

    staged
        .persist(out_file)
        .map_err(|e| out_err(e.error))?;

    info!(
        "bundle: {} files ({} bytes) written to {}, {} skipped",
        summary.files,
        summary.bytes,
        out_file.display(),
        summary.skipped
    );
    Ok(summary)
}

/// Bundle `manifest` into [`BUNDLE_FILENAME`] under `out_dir` and return a
/// manifest tracking only that archive.
///
/// The returned entry carries the file count and total size of the full
/// `manifest`; the global imports are carried over.
///
/// # Errors
///
/// Returns any error from [`bundle`], or from hashing the new archive.
pub fn bundle_manifest(
    manifest: &Manifest,
    out_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<Manifest, BundleError> {
    let archive = out_dir.join(BUNDLE_FILENAME);
    bundle(manifest, &archive, reporter)?;

    let mut packed = Manifest::with_root(out_dir);
    Builder::new().append(&mut packed, &archive)?;
    for entry in &mut packed.assets {
        entry.archive_file_count = Some(manifest.file_count);
        entry.uncompressed_size = Some(manifest.total_size);
    }
    for import in &manifest.global_imports {
        packed.add_global_import(import.clone());
    }
    packed.finalize(Utc::now());
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use std::collections::BTreeSet;
    use std::fs;

    fn write(root: &Path, name: &str, data: &[u8]) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    fn archive_names(path: &Path) -> BTreeSet<String> {
        let file = fs::File::open(path).unwrap();
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn app_tree() -> (tempfile::TempDir, Manifest) {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ui/widget.yaml", b"type: Rectangle\n");
        write(dir.path(), "ui/widget.qml", b"Rectangle {}");
        write(dir.path(), "ui/panel.qml", b"Item {}");
        write(dir.path(), "img/logo.svg", b"<svg/>");
        write(dir.path(), "vendor/lib.zip", b"PK\x05\x06");
        let manifest = Builder::new().build(dir.path()).unwrap();
        (dir, manifest)
    }

    #[test]
    fn excludes_generated_qml_and_nested_archives() {
        let (dir, manifest) = app_tree();
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("app.tar.gz");

        let summary = bundle(&manifest, &path, &NullReporter).unwrap();

        let names = archive_names(&path);
        assert!(names.contains("ui/widget.yaml"));
        assert!(names.contains("ui/panel.qml"));
        assert!(names.contains("img/logo.svg"));
        assert!(!names.contains("ui/widget.qml"));
        assert!(!names.contains("vendor/lib.zip"));

        assert_eq!(summary.files, 3);
        assert_eq!(summary.skipped, 2);
        let expected: u64 = ["ui/widget.yaml", "ui/panel.qml", "img/logo.svg"]
            .iter()
            .map(|n| fs::metadata(dir.path().join(n)).unwrap().len())
            .sum();
        assert_eq!(summary.bytes, expected);
    }

    #[test]
    fn tampered_file_aborts_without_output() {
        let (dir, manifest) = app_tree();
        write(dir.path(), "img/logo.svg", b"<SVG/>");
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("app.tar.gz");

        let err = bundle(&manifest, &path, &NullReporter).unwrap_err();

        assert!(matches!(
            err,
            BundleError::Invalid(ValidationError::HashMismatch { ref name, .. }) if name == "img/logo.svg"
        ));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_aborts() {
        let (dir, manifest) = app_tree();
        fs::remove_file(dir.path().join("ui/panel.qml")).unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = bundle(&manifest, &out.path().join("b.tar.gz"), &NullReporter).unwrap_err();
        assert!(matches!(
            err,
            BundleError::Invalid(ValidationError::Missing { .. })
        ));
    }

    #[test]
    fn escaping_entry_name_is_rejected() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("app");
        write(&root, "ok.txt", b"ok");
        write(base.path(), "secret.txt", b"secret");

        let mut manifest = Manifest::with_root(&root);
        manifest.append(
            hydra_schema::EntryKind::Asset,
            hydra_schema::ManifestEntry::new(
                "../secret.txt",
                6,
                crate::hashing::sha256_bytes(b"secret"),
                "text/plain",
                false,
            ),
        );
        let path = base.path().join("out.tar.gz");

        let err = bundle(&manifest, &path, &NullReporter).unwrap_err();
        assert!(matches!(err, BundleError::Invalid(ValidationError::UnsafeName(_))));
        assert!(!path.exists());
    }

    #[test]
    fn unbound_manifest_is_rejected() {
        let (_dir, manifest) = app_tree();
        let loaded = Manifest::from_yaml_str(&manifest.to_yaml_string().unwrap()).unwrap();
        let out = tempfile::tempdir().unwrap();

        let err = bundle(&loaded, &out.path().join("x.tar.gz"), &NullReporter).unwrap_err();
        assert!(matches!(err, BundleError::NoRoot));
    }

    #[test]
    fn bundle_manifest_tracks_single_archive() {
        let (_dir, mut manifest) = app_tree();
        manifest.add_global_import("ui");
        let out = tempfile::tempdir().unwrap();

        let packed = bundle_manifest(&manifest, out.path(), &NullReporter).unwrap();

        assert_eq!(packed.file_count, 1);
        assert!(packed.modules.is_empty());
        assert_eq!(packed.global_imports, vec!["ui"]);

        let entry = &packed.assets[0];
        assert_eq!(entry.name, BUNDLE_FILENAME);
        assert!(entry.archive);
        assert_eq!(entry.archive_file_count, Some(5));
        assert_eq!(entry.archive_file_count, Some(manifest.file_count));
        assert_eq!(entry.uncompressed_size, Some(manifest.total_size));
        assert!(validate_entry(entry, out.path()).is_ok());
    }
}
