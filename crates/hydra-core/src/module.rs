//! Module classification and per-directory module specs.
//!
//! Both capabilities belong to the downstream code generator; the builder
//! only consults them through [`ModuleClassifier`] and [`ModuleSpecParser`].

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Per-directory descriptor declaring properties of the modules beside it.
pub const MODULE_SPEC_FILENAME: &str = "module.yaml";

/// Directory descriptor consumed by the QML engine.
pub const QMLDIR_FILENAME: &str = "qmldir";

/// Top-level composition file generated for the application root.
pub const ROOT_COMPOSITION_FILENAME: &str = "Hydra.qml";

#[derive(Error, Debug)]
pub enum ModuleSpecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed module spec: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parsed contents of a [`MODULE_SPEC_FILENAME`] file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModuleSpec {
    /// When set, the containing directory is a global import path.
    #[serde(default)]
    pub global: bool,
}

/// Decides whether a file is a module (compiled downstream) or an asset.
pub trait ModuleClassifier: Send + Sync {
    /// True if `path` holds a module definition.
    fn is_module(&self, path: &Path) -> bool;
}

/// Parses per-directory module spec files.
pub trait ModuleSpecParser: Send + Sync {
    /// Parse the spec at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    fn parse(&self, path: &Path) -> Result<ModuleSpec, ModuleSpecError>;
}

/// Built-in rules: YAML documents are modules, and module specs are YAML
/// mappings with an optional `global` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModules;

impl ModuleClassifier for DefaultModules {
    fn is_module(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
    }
}

impl ModuleSpecParser for DefaultModules {
    fn parse(&self, path: &Path) -> Result<ModuleSpec, ModuleSpecError> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(ModuleSpec::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Structural files that are consumed downstream and never tracked.
pub fn is_structural(file_name: &str) -> bool {
    matches!(
        file_name,
        QMLDIR_FILENAME | MODULE_SPEC_FILENAME | ROOT_COMPOSITION_FILENAME
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn classifies_yaml_as_module() {
        assert!(DefaultModules.is_module(Path::new("ui/widget.yaml")));
        assert!(DefaultModules.is_module(Path::new("ui/Widget.YML")));
        assert!(!DefaultModules.is_module(Path::new("ui/widget.qml")));
        assert!(!DefaultModules.is_module(Path::new("README")));
    }

    #[test]
    fn parses_global_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODULE_SPEC_FILENAME);

        fs::write(&path, "global: true\nname: shared\n").unwrap();
        assert!(DefaultModules.parse(&path).unwrap().global);

        fs::write(&path, "name: local\n").unwrap();
        assert!(!DefaultModules.parse(&path).unwrap().global);

        fs::write(&path, "").unwrap();
        assert_eq!(DefaultModules.parse(&path).unwrap(), ModuleSpec::default());
    }

    #[test]
    fn malformed_spec_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODULE_SPEC_FILENAME);
        fs::write(&path, "global: [unterminated").unwrap();
        assert!(matches!(
            DefaultModules.parse(&path),
            Err(ModuleSpecError::Yaml(_))
        ));
    }

    #[test]
    fn structural_names() {
        assert!(is_structural("qmldir"));
        assert!(is_structural("Hydra.qml"));
        assert!(is_structural("module.yaml"));
        assert!(!is_structural("main.qml"));
    }
}
