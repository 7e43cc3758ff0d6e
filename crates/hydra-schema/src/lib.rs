//! Shared types and wire format for hydra manifests.
//!
//! A [`Manifest`] records every tracked file of an application tree
//! (relative name, size, SHA-256 and MIME type) together with the
//! directories that must be registered as global import paths. It is
//! persisted as YAML, wrapped in an [`Application`] envelope.

pub mod hash;
pub mod manifest;

// Re-exports
pub use hash::*;
pub use manifest::*;

/// Default file name a manifest is written to and read from.
pub const MANIFEST_FILENAME: &str = "manifest.yaml";
