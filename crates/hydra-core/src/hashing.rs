//! Content hashing and type detection primitives.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use hydra_schema::Sha256Hash;
use sha2::{Digest, Sha256};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Compute the SHA-256 of a file by streaming it through the hasher.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> io::Result<Sha256Hash> {
    let mut file = File::open(path)?;
    sha256_reader(&mut file)
}

/// Compute the SHA-256 of everything readable from `reader`.
///
/// # Errors
///
/// Returns any I/O error raised by the reader.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<Sha256Hash> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let count = reader.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(Sha256Hash::from_digest(&hasher.finalize()))
}

/// SHA-256 of an in-memory buffer.
pub fn sha256_bytes(data: &[u8]) -> Sha256Hash {
    Sha256Hash::from_digest(&Sha256::digest(data))
}

/// Best-effort MIME type for a file.
///
/// The extension is consulted first; files with an unknown extension are
/// sniffed by magic bytes. Anything unrecognized is reported as
/// `application/octet-stream`.
pub fn detect_mime(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }

    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => DEFAULT_MIME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn hashes_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();

        let hash = sha256_file(&path).unwrap();
        assert_eq!(
            hash.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(hash, sha256_bytes(b"hello world"));
    }

    #[test]
    fn hashing_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_file(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<html></html>").unwrap();
        assert_eq!(detect_mime(&path), "text/html");
    }

    #[test]
    fn mime_from_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]).unwrap();
        assert_eq!(detect_mime(&path), "image/png");
    }

    #[test]
    fn mime_falls_back_to_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        assert_eq!(detect_mime(&path), DEFAULT_MIME);
    }
}
