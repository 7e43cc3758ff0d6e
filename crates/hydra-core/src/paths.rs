//! Where bundles are looked up by name.

use std::path::{Path, PathBuf};

use dirs::home_dir;
use tracing::debug;

/// Environment variable holding extra, colon-separated search directories.
pub const SEARCH_PATH_ENV: &str = "HYDRA_PATH";

/// Directories searched after any from [`SEARCH_PATH_ENV`].
pub const DEFAULT_SEARCH_PATHS: &[&str] = &[".", "~/.cache/hydra/bundles", "/opt/hydra"];

/// Bundle file extensions tried for each search directory, in order.
const BUNDLE_EXTENSIONS: &[&str] = &["tar.gz", "zip"];

/// Search directories: `HYDRA_PATH` entries first, then the defaults.
pub fn search_paths() -> Vec<PathBuf> {
    search_paths_from(std::env::var(SEARCH_PATH_ENV).ok().as_deref())
}

/// Search directories given an explicit `HYDRA_PATH` value.
pub fn search_paths_from(hydra_path: Option<&str>) -> Vec<PathBuf> {
    hydra_path
        .unwrap_or_default()
        .split(':')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .chain(DEFAULT_SEARCH_PATHS.iter().copied())
        .map(expand_home)
        .collect()
}

/// Locate a bundle by name using [`search_paths`].
pub fn find_bundle(name: &str) -> Option<PathBuf> {
    find_bundle_in(name, &search_paths())
}

/// Locate a bundle by name: `name` itself if it exists, otherwise the
/// first `<dir>/<name>.tar.gz` or `<dir>/<name>.zip` found in `dirs`.
pub fn find_bundle_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let direct = std::iter::once(PathBuf::from(name));
    let searched = dirs.iter().flat_map(|dir| {
        BUNDLE_EXTENSIONS
            .iter()
            .map(move |ext| dir.join(format!("{name}.{ext}")))
    });

    for candidate in direct.chain(searched) {
        if candidate.exists() {
            debug!("find: matched {}", candidate.display());
            return Some(candidate);
        }
        debug!("find: trying {}", candidate.display());
    }
    None
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn env_entries_come_first() {
        let paths = search_paths_from(Some("/srv/a: :/srv/b"));
        assert_eq!(paths[0], PathBuf::from("/srv/a"));
        assert_eq!(paths[1], PathBuf::from("/srv/b"));
        assert_eq!(paths[2], PathBuf::from("."));
        assert_eq!(paths.last(), Some(&PathBuf::from("/opt/hydra")));
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn defaults_without_env() {
        let paths = search_paths_from(None);
        assert_eq!(paths.len(), DEFAULT_SEARCH_PATHS.len());
        if let Some(home) = home_dir() {
            assert_eq!(paths[1], home.join(".cache/hydra/bundles"));
        }
    }

    #[test]
    fn finds_first_matching_bundle() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(b.path().join("demo.zip"), b"PK").unwrap();
        fs::write(b.path().join("demo.tar.gz"), b"\x1f\x8b").unwrap();
        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];

        assert_eq!(
            find_bundle_in("demo", &dirs),
            Some(b.path().join("demo.tar.gz"))
        );
        assert_eq!(find_bundle_in("absent", &dirs), None);
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("custom.bundle");
        fs::write(&bundle, b"x").unwrap();

        let found = find_bundle_in(bundle.to_str().unwrap(), &[]);
        assert_eq!(found, Some(bundle));
    }
}
