//! Filesystem backend for plain paths and `file://` roots.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{ByteStream, FetchError, Retriever};

/// Reads files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRetriever;

impl LocalRetriever {
    /// Resolve `name` beneath a local or `file://` root.
    pub fn resolve(root: &str, name: &str) -> PathBuf {
        let base = root.strip_prefix("file://").unwrap_or(root);
        let mut path = PathBuf::from(base);
        for part in name.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }
}

#[async_trait]
impl Retriever for LocalRetriever {
    async fn open(&self, root: &str, name: &str) -> Result<ByteStream, FetchError> {
        let path = Self::resolve(root, name);
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn resolves_file_scheme_and_nested_names() {
        assert_eq!(
            LocalRetriever::resolve("file:///srv/app", "a/b.txt"),
            PathBuf::from("/srv/app/a/b.txt")
        );
        assert_eq!(
            LocalRetriever::resolve("/srv/app", "c.txt"),
            PathBuf::from("/srv/app/c.txt")
        );
    }

    #[tokio::test]
    async fn opens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/x.txt"), "contents").unwrap();

        let root = dir.path().to_str().unwrap();
        let mut stream = LocalRetriever.open(root, "sub/x.txt").await.unwrap();
        let mut buf = String::new();
        stream.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "contents");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = format!("file://{}", dir.path().display());
        let err = LocalRetriever.open(&root, "nope.txt").await.err().unwrap();
        assert!(matches!(err, FetchError::NotFound(_)));
    }
}
