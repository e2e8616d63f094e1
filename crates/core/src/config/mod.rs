//! Configuration for trellis
//!
//! Two unrelated things live here: [`Settings`], which tunes the
//! orchestration core itself, and the namespaced key/value [`ConfigStore`]
//! that plugins read and write through the orchestration context.

mod key;
mod store;

pub use key::{ConfigKey, ConfigNamespace, MAX_SEGMENT_LEN};
pub use store::{
    ConfigBackend, ConfigStore, ConfigValue, DeleteResult, FileConfigBackend, MemoryConfigBackend,
};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the orchestration core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Resolve sibling dependency versions concurrently
    pub parallel_version_resolution: bool,

    /// Persist the config store to this TOML file instead of memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallel_version_resolution: true,
            config_file: None,
        }
    }
}

impl Settings {
    /// Parse settings from TOML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the document is not valid
    /// settings TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::invalid_parameter(format!("Invalid settings: {e}")))
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`] if the file cannot be read and
    /// [`Error::InvalidParameter`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::underlying(format!("Failed to read settings {}", path.display()), e)
        })?;
        Self::from_toml_str(&content)
    }

    /// Open the config store these settings describe.
    ///
    /// # Errors
    ///
    /// See [`FileConfigBackend::open`].
    pub fn config_store(&self) -> Result<ConfigStore> {
        match &self.config_file {
            Some(path) => ConfigStore::open_file(path),
            None => Ok(ConfigStore::in_memory()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.parallel_version_resolution);
        assert_eq!(settings.config_file, None);
        assert_eq!(Settings::from_toml_str("").unwrap(), settings);
    }

    #[test]
    fn test_parse_camel_case() {
        let settings = Settings::from_toml_str(
            r#"
            parallelVersionResolution = false
            configFile = ".trellis/config.toml"
            "#,
        )
        .unwrap();

        assert!(!settings.parallel_version_resolution);
        assert_eq!(
            settings.config_file,
            Some(PathBuf::from(".trellis/config.toml"))
        );
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::from_toml_str("parallelVersionResolution = \"yes\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnderlyingFailure);
    }

    #[test]
    fn test_config_store_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            config_file: Some(dir.path().join("config.toml")),
            ..Settings::default()
        };

        settings
            .config_store()
            .unwrap()
            .set_config(&["project", "name"], "demo")
            .unwrap();
        assert!(dir.path().join("config.toml").exists());
    }
}
