//! One module per subcommand.

pub mod bundle;
pub mod clean;
pub mod find;
pub mod generate;
pub mod inspect;
pub mod sync;
pub mod verify;

use anyhow::{Context, Result};
use hydra_schema::Manifest;
use std::path::Path;

/// Load a manifest, naming the file on failure.
pub(crate) fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("failed to load manifest {}", path.display()))
}
