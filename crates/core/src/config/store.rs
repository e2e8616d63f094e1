//! Namespaced key/value configuration store
//!
//! [`ConfigStore`] validates every key before touching its backend. Backends
//! only ever see dotted keys that passed [`ConfigKey::parse`].

use super::key::ConfigKey;
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Storage for validated configuration entries.
pub trait ConfigBackend: Send + Sync {
    /// Read the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`] if the backing storage cannot be read.
    fn get(&self, key: &ConfigKey) -> Result<Option<String>>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`] if the backing storage cannot be written.
    fn set(&self, key: &ConfigKey, value: String) -> Result<()>;

    /// Remove the value at `key`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`] if the backing storage cannot be written.
    fn remove(&self, key: &ConfigKey) -> Result<bool>;
}

/// Process-local configuration backend.
#[derive(Debug, Default)]
pub struct MemoryConfigBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryConfigBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigBackend for MemoryConfigBackend {
    fn get(&self, key: &ConfigKey) -> Result<Option<String>> {
        let entries = self.entries.read();
        Ok(entries.get(&key.to_string()).cloned())
    }

    fn set(&self, key: &ConfigKey, value: String) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &ConfigKey) -> Result<bool> {
        let mut entries = self.entries.write();
        Ok(entries.remove(&key.to_string()).is_some())
    }
}

/// Configuration backend persisted to a TOML file.
///
/// The file holds one quoted dotted key per entry:
///
/// ```toml
/// "project.my.variable" = "myvalue"
/// ```
///
/// Every mutation rewrites the whole file through a temporary file in the
/// same directory, so readers never observe a partial write.
#[derive(Debug)]
pub struct FileConfigBackend {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileConfigBackend {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Underlying`] if the file cannot be read or parsed and
    /// [`Error::InvalidParameter`] if it contains an invalid key.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::underlying(format!("Failed to read config file {}", path.display()), e)
            })?;
            let entries: BTreeMap<String, String> = toml::from_str(&content).map_err(|e| {
                Error::underlying(format!("Failed to parse config file {}", path.display()), e)
            })?;
            for key in entries.keys() {
                ConfigKey::parse_dotted(key)?;
            }
            entries
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened config file");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::underlying(format!("Failed to create directory {}", dir.display()), e)
        })?;

        let content = toml::to_string(entries)
            .map_err(|e| Error::underlying("Failed to serialize config entries", e))?;

        let write_failed = |e: std::io::Error| {
            Error::underlying(
                format!("Failed to write config file {}", self.path.display()),
                e,
            )
        };
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
        file.write_all(content.as_bytes()).map_err(write_failed)?;
        file.as_file().sync_all().map_err(write_failed)?;
        file.persist(&self.path).map_err(|e| write_failed(e.error))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Wrote config file");
        Ok(())
    }
}

impl ConfigBackend for FileConfigBackend {
    fn get(&self, key: &ConfigKey) -> Result<Option<String>> {
        let entries = self.entries.read();
        Ok(entries.get(&key.to_string()).cloned())
    }

    fn set(&self, key: &ConfigKey, value: String) -> Result<()> {
        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &ConfigKey) -> Result<bool> {
        let mut entries = self.entries.write();
        let dotted = key.to_string();
        if !entries.contains_key(&dotted) {
            return Ok(false);
        }
        let mut updated = entries.clone();
        updated.remove(&dotted);
        self.persist(&updated)?;
        *entries = updated;
        Ok(true)
    }
}

/// Result of [`ConfigStore::get_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    /// The stored value
    pub value: String,
}

/// Result of [`ConfigStore::delete_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Whether an entry existed and was removed
    pub found: bool,
}

/// Validating front end over a [`ConfigBackend`].
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn ConfigBackend>,
}

impl ConfigStore {
    /// Create a store over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }

    /// Create a store with a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigBackend::new()))
    }

    /// Open a store persisted at `path`.
    ///
    /// # Errors
    ///
    /// See [`FileConfigBackend::open`].
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(FileConfigBackend::open(path)?)))
    }

    /// Store `value` at `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key and
    /// [`Error::Underlying`] if the backend fails.
    pub fn set_config<S: AsRef<str>>(&self, key: &[S], value: impl Into<String>) -> Result<()> {
        let key = ConfigKey::parse(key)?;
        self.backend.set(&key, value.into())?;
        debug!(key = %key, "Set config value");
        Ok(())
    }

    /// Read the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key,
    /// [`Error::NotFound`] if nothing is stored there, and
    /// [`Error::Underlying`] if the backend fails.
    pub fn get_config<S: AsRef<str>>(&self, key: &[S]) -> Result<ConfigValue> {
        let key = ConfigKey::parse(key)?;
        self.backend
            .get(&key)?
            .map(|value| ConfigValue { value })
            .ok_or_else(|| Error::not_found("config key", key.to_string()))
    }

    /// Remove the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key and
    /// [`Error::Underlying`] if the backend fails. A missing entry is not an
    /// error.
    pub fn delete_config<S: AsRef<str>>(&self, key: &[S]) -> Result<DeleteResult> {
        let key = ConfigKey::parse(key)?;
        let found = self.backend.remove(&key)?;
        debug!(key = %key, found, "Deleted config value");
        Ok(DeleteResult { found })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const KEY: [&str; 3] = ["project", "my", "variable"];

    #[test]
    fn test_set_then_get() {
        let store = ConfigStore::in_memory();
        store.set_config(&KEY, "myvalue").unwrap();
        assert_eq!(
            store.get_config(&KEY).unwrap(),
            ConfigValue {
                value: "myvalue".into()
            }
        );
    }

    #[test]
    fn test_set_overwrites() {
        let store = ConfigStore::in_memory();
        store.set_config(&KEY, "one").unwrap();
        store.set_config(&KEY, "two").unwrap();
        assert_eq!(store.get_config(&KEY).unwrap().value, "two");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let err = ConfigStore::in_memory().get_config(&KEY).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "No config key named 'project.my.variable'");
    }

    #[test]
    fn test_delete_reports_found() {
        let store = ConfigStore::in_memory();
        assert_eq!(store.delete_config(&KEY).unwrap(), DeleteResult { found: false });

        store.set_config(&KEY, "myvalue").unwrap();
        assert_eq!(store.delete_config(&KEY).unwrap(), DeleteResult { found: true });
        assert_eq!(store.get_config(&KEY).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_keys_rejected_by_every_operation() {
        let store = ConfigStore::in_memory();
        store.set_config(&KEY, "myvalue").unwrap();

        for key in [&["bla", "my", "variable"][..], &["project", "!4215"][..]] {
            assert_eq!(
                store.set_config(key, "x").unwrap_err().kind(),
                ErrorKind::InvalidParameter
            );
            assert_eq!(store.get_config(key).unwrap_err().kind(), ErrorKind::InvalidParameter);
            assert_eq!(
                store.delete_config(key).unwrap_err().kind(),
                ErrorKind::InvalidParameter
            );
        }
    }

    #[test]
    fn test_file_backend_persists_flat_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let store = ConfigStore::open_file(&path).unwrap();
        store.set_config(&KEY, "myvalue").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), r#""project.my.variable" = "myvalue""#);

        let reopened = ConfigStore::open_file(&path).unwrap();
        assert_eq!(reopened.get_config(&KEY).unwrap().value, "myvalue");
    }
}
