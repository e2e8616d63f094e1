//! Module version descriptors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of a single source tree, as reported by version control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeVersion {
    /// Opaque fingerprint of the tree's content
    pub version_string: String,
    /// Seconds since the Unix epoch when the tree has uncommitted changes
    pub dirty_timestamp: Option<i64>,
}

impl TreeVersion {
    /// A clean (reproducible) tree version.
    #[must_use]
    pub fn clean(version_string: impl Into<String>) -> Self {
        Self {
            version_string: version_string.into(),
            dirty_timestamp: None,
        }
    }

    /// A dirty tree version observed at `timestamp`.
    #[must_use]
    pub fn dirty(version_string: impl Into<String>, timestamp: i64) -> Self {
        Self {
            version_string: version_string.into(),
            dirty_timestamp: Some(timestamp),
        }
    }

    /// Whether the tree has uncommitted changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty_timestamp.is_some()
    }

    /// The dirty timestamp as a date, if dirty and representable.
    #[must_use]
    pub fn dirty_at(&self) -> Option<DateTime<Utc>> {
        self.dirty_timestamp
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Resolved version of a module, including its transitive dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleVersion {
    /// Opaque fingerprint of the module's content and dependency versions
    pub version_string: String,
    /// Seconds since the Unix epoch when the state is not reproducible
    pub dirty_timestamp: Option<i64>,
    /// Resolved version of every transitive dependency, by module name
    #[serde(default)]
    pub dependency_versions: BTreeMap<String, TreeVersion>,
}

impl ModuleVersion {
    /// Combine a tree version with the versions of the dependencies it covers.
    #[must_use]
    pub fn from_tree(
        tree: TreeVersion,
        dependency_versions: BTreeMap<String, TreeVersion>,
    ) -> Self {
        Self {
            version_string: tree.version_string,
            dirty_timestamp: tree.dirty_timestamp,
            dependency_versions,
        }
    }

    /// This version without its dependency map.
    #[must_use]
    pub fn tree_version(&self) -> TreeVersion {
        TreeVersion {
            version_string: self.version_string.clone(),
            dirty_timestamp: self.dirty_timestamp,
        }
    }

    /// Whether the module state is not reproducible.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty_timestamp.is_some()
    }

    /// The dirty timestamp as a date, if dirty and representable.
    #[must_use]
    pub fn dirty_at(&self) -> Option<DateTime<Utc>> {
        self.tree_version().dirty_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case() {
        let version = ModuleVersion {
            version_string: "banana".into(),
            dirty_timestamp: Some(987_654_321),
            dependency_versions: BTreeMap::new(),
        };

        assert_eq!(
            serde_json::to_value(&version).unwrap(),
            json!({
                "versionString": "banana",
                "dirtyTimestamp": 987_654_321,
                "dependencyVersions": {},
            })
        );
    }

    #[test]
    fn test_dirty_at() {
        let version = TreeVersion::dirty("abc", 987_654_321);
        assert!(version.is_dirty());
        assert_eq!(version.dirty_at().unwrap().timestamp(), 987_654_321);
        assert_eq!(TreeVersion::clean("abc").dirty_at(), None);
    }

    #[test]
    fn test_from_tree_round_trips_tree_version() {
        let tree = TreeVersion::dirty("abc", 1);
        let mut deps = BTreeMap::new();
        deps.insert("module-a".to_string(), TreeVersion::clean("def"));

        let version = ModuleVersion::from_tree(tree.clone(), deps);
        assert_eq!(version.tree_version(), tree);
        assert_eq!(version.dependency_versions.len(), 1);
    }
}
