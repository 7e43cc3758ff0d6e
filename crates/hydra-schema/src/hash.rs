//! Validated SHA-256 digests as stored in manifests.

use serde::{Deserialize, Deserializer, Serialize};

/// Error returned when a string is not a well-formed SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// The hex portion is not exactly 64 characters long.
    #[error("invalid SHA256 digest: expected 64 hex characters, got {len} in '{value}'")]
    Length {
        /// Number of characters found.
        len: usize,
        /// The rejected input.
        value: String,
    },

    /// The input contains characters outside `[0-9a-fA-F]`.
    #[error("invalid SHA256 digest: contains non-hex characters in '{0}'")]
    NotHex(String),
}

/// A validated SHA-256 digest (64 lowercase hex characters).
///
/// Digests are validated at deserialization time so a malformed manifest is
/// rejected on load instead of surfacing later as a spurious mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Create a new `Sha256Hash`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix and normalizes
    /// them to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the hex portion is not exactly 64 ASCII hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, HashError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(HashError::Length {
                len: hex.len(),
                value: s.clone(),
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::NotHex(s.clone()));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Build a hash from the raw 32-byte output of a SHA-256 hasher.
    pub fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` characters, for compact display.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha256Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn accepts_prefixed_and_uppercase() {
        let upper = format!("sha256:{}", EMPTY.to_uppercase());
        let hash = Sha256Hash::new(upper).unwrap();
        assert_eq!(hash.as_str(), EMPTY);
    }

    #[test]
    fn rejects_short_digest() {
        let err = Sha256Hash::new("abc123").unwrap_err();
        assert!(matches!(err, HashError::Length { len: 6, .. }));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = "z".repeat(64);
        assert!(matches!(Sha256Hash::new(bad), Err(HashError::NotHex(_))));
    }

    #[test]
    fn from_digest_encodes_hex() {
        let hash = Sha256Hash::from_digest(&[0xab; 32]);
        assert_eq!(hash.as_str(), "ab".repeat(32));
        assert_eq!(hash.short(8), "abababab");
    }
}
