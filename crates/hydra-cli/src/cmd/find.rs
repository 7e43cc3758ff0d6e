//! Find command

use anyhow::{Result, bail};
use hydra_core::paths;

/// Print the path of the bundle called `name`.
pub fn find(name: &str) -> Result<()> {
    match paths::find_bundle(name) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("bundle {name:?} not found"),
    }
}
