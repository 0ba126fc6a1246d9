//! Configuration loader
//!
//! Reads the run configuration from a JSON file:
//!
//! ```json
//! {
//!   "master": { "bias": "master/bias.bin", "dark": null },
//!   "calib":  { "bias": "raw/bias.raw", "dark": "raw/dark.raw" }
//! }
//! ```
//!
//! `master` maps a category to the file its master frame is cached in
//! (`null` disables caching), `calib` maps it to its raw input. Relative paths
//! are resolved against the directory holding the configuration file. Other
//! top-level keys are ignored.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::error::CalibError;
use crate::core::model::Category;
use crate::core::paths::{has_extension, is_file, resolve_against};

/// Required extension of a configuration file
pub const CONFIG_EXTENSION: &str = "json";

/// Default configuration file name
pub const DEFAULT_CONFIG: &str = "config.json";

/// Per-category paths of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CalibrationConfig {
    /// Where each category's master frame is read from and written to
    #[serde(default)]
    pub master: BTreeMap<Category, Option<PathBuf>>,

    /// Raw input each category's master frame is built from
    #[serde(default)]
    pub calib: BTreeMap<Category, PathBuf>,
}

impl CalibrationConfig {
    /// Every category named by either map, in sorted order
    pub fn categories(&self) -> BTreeSet<&Category> {
        self.master.keys().chain(self.calib.keys()).collect()
    }

    pub fn persisted_path(&self, category: &Category) -> Option<&Path> {
        self.master.get(category).and_then(|p| p.as_deref())
    }

    pub fn raw_path(&self, category: &Category) -> Option<&Path> {
        self.calib.get(category).map(PathBuf::as_path)
    }

    /// Resolve relative paths against `base`
    pub fn resolve(mut self, base: &Path) -> Self {
        for path in self.master.values_mut().flatten() {
            let resolved = resolve_against(base, path);
            *path = resolved;
        }
        for path in self.calib.values_mut() {
            let resolved = resolve_against(base, path);
            *path = resolved;
        }
        self
    }
}

/// Check that `path` names an existing `.json` file
pub fn validate_config_path(path: &Path) -> Result<(), CalibError> {
    if !is_file(path) {
        return Err(CalibError::config(path, "configuration file does not exist"));
    }
    if !has_extension(path, CONFIG_EXTENSION) {
        return Err(CalibError::config(
            path,
            format!("configuration file extension is not '.{}'", CONFIG_EXTENSION),
        ));
    }
    Ok(())
}

/// Load and resolve the configuration at `path`
pub fn load_config(path: &Path) -> Result<CalibrationConfig, CalibError> {
    validate_config_path(path)?;

    info!(path = %path.display(), "reading configuration file");
    let file = File::open(path).map_err(|e| CalibError::config(path, e.to_string()))?;
    let config: CalibrationConfig = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| CalibError::config(path, format!("malformed configuration: {}", e)))?;
    debug!(?config, "configuration contents");

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.resolve(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_config() {
        let temp = tempdir().unwrap();
        let path = write_config(
            temp.path(),
            "config.json",
            r#"{
                "master": {"bias": "master/bias.bin", "dark": null},
                "calib": {"bias": "raw/bias.raw", "dark": "/abs/dark.raw"},
                "object": {"target": "ignored"}
            }"#,
        );

        let config = load_config(&path).unwrap();
        let bias = Category::new("bias");
        let dark = Category::new("dark");

        assert_eq!(
            config.persisted_path(&bias),
            Some(temp.path().join("master/bias.bin").as_path())
        );
        assert_eq!(config.persisted_path(&dark), None);
        assert_eq!(
            config.raw_path(&bias),
            Some(temp.path().join("raw/bias.raw").as_path())
        );
        assert_eq!(config.raw_path(&dark), Some(Path::new("/abs/dark.raw")));
    }

    #[test]
    fn test_categories_union_sorted() {
        let temp = tempdir().unwrap();
        let path = write_config(
            temp.path(),
            "config.json",
            r#"{"master": {"flat": "flat.bin", "bias": "bias.bin"}, "calib": {"dark": "dark.raw", "bias": "bias.raw"}}"#,
        );

        let config = load_config(&path).unwrap();
        let names: Vec<_> = config.categories().into_iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["bias", "dark", "flat"]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let temp = tempdir().unwrap();
        let path = write_config(temp.path(), "config.json", "{}");

        let config = load_config(&path).unwrap();
        assert!(config.categories().is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let temp = tempdir().unwrap();
        let err = load_config(&temp.path().join("config.json")).unwrap_err();
        assert!(matches!(err, CalibError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_wrong_config_extension() {
        let temp = tempdir().unwrap();
        let path = write_config(temp.path(), "config.yaml", "{}");

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("extension is not '.json'"));
    }

    #[test]
    fn test_config_extension_case_sensitive() {
        let temp = tempdir().unwrap();
        let path = write_config(temp.path(), "config.JSON", "{}");
        assert!(validate_config_path(&path).is_err());
    }

    #[test]
    fn test_malformed_config() {
        let temp = tempdir().unwrap();
        let path = write_config(temp.path(), "config.json", r#"{"master": ["bias"]}"#);

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, CalibError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("malformed configuration"));
    }
}
