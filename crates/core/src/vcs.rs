//! Version control abstraction
//!
//! The [`VersionControlPort`] is the capability the version resolver uses to
//! fingerprint a module's source state. Concrete backends (git or otherwise)
//! live outside this crate. [`HashingVersionControl`] adapts a backend that
//! can only fingerprint a single tree into a full port by folding in the
//! dependency versions.

use crate::{Module, Result, TreeVersion};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::iter;

/// Trait for version control backends
#[async_trait]
pub trait VersionControlPort: Send + Sync {
    /// Produce the version of `module`'s current source state, given the
    /// already resolved versions of its transitive dependencies.
    ///
    /// Backend failures (I/O, "not a repository", ...) are returned as
    /// [`Error::Underlying`](crate::Error::Underlying) and surfaced unchanged.
    async fn resolve_tree_version(
        &self,
        module: &Module,
        dependency_versions: &BTreeMap<String, TreeVersion>,
    ) -> Result<TreeVersion>;

    /// Get the name of the backend
    fn name(&self) -> &'static str;
}

/// A backend that can fingerprint the source tree of a single module.
#[async_trait]
pub trait TreeVersionSource: Send + Sync {
    /// The version of `module`'s own source tree.
    async fn tree_version(&self, module: &Module) -> Result<TreeVersion>;
}

/// Port that combines a module's own tree version with its dependency versions.
pub struct HashingVersionControl<S> {
    source: S,
}

impl<S: TreeVersionSource> HashingVersionControl<S> {
    /// Wrap a tree version source.
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: TreeVersionSource> VersionControlPort for HashingVersionControl<S> {
    async fn resolve_tree_version(
        &self,
        module: &Module,
        dependency_versions: &BTreeMap<String, TreeVersion>,
    ) -> Result<TreeVersion> {
        let own = self.source.tree_version(module).await?;
        Ok(combine_versions(&module.name, own, dependency_versions))
    }

    fn name(&self) -> &'static str {
        "hashing"
    }
}

/// Fold dependency versions into a module's own tree version.
///
/// - No dependencies: the module's own version.
/// - Any dirty version among the module and its dependencies: the most
///   recently dirtied one, suffixed with its timestamp.
/// - Otherwise `v-` followed by a hash of every `name:version` pair.
#[must_use]
pub fn combine_versions(
    module_name: &str,
    own: TreeVersion,
    dependency_versions: &BTreeMap<String, TreeVersion>,
) -> TreeVersion {
    if dependency_versions.is_empty() {
        return own;
    }

    let all: Vec<(&str, &TreeVersion)> = iter::once((module_name, &own))
        .chain(
            dependency_versions
                .iter()
                .map(|(name, version)| (name.as_str(), version)),
        )
        .collect();

    let latest_dirty = all
        .iter()
        .filter_map(|(_, version)| version.dirty_timestamp.map(|ts| (*version, ts)))
        .max_by_key(|(_, ts)| *ts);
    if let Some((version, timestamp)) = latest_dirty {
        return TreeVersion::dirty(format!("{}-{timestamp}", version.version_string), timestamp);
    }

    let mut lines: Vec<String> = all
        .iter()
        .map(|(name, version)| format!("{name}:{}", version.version_string))
        .collect();
    lines.sort();

    let digest = hex::encode(Sha256::digest(lines.join("\n").as_bytes()));
    TreeVersion::clean(format!("v-{}", &digest[..10]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct FixedSource(TreeVersion);

    #[async_trait]
    impl TreeVersionSource for FixedSource {
        async fn tree_version(&self, _module: &Module) -> Result<TreeVersion> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl TreeVersionSource for BrokenSource {
        async fn tree_version(&self, module: &Module) -> Result<TreeVersion> {
            Err(Error::underlying(
                format!("Cannot read tree for {}", module.name),
                "not a repository",
            ))
        }
    }

    fn deps(entries: &[(&str, TreeVersion)]) -> BTreeMap<String, TreeVersion> {
        entries
            .iter()
            .map(|(name, version)| ((*name).to_string(), version.clone()))
            .collect()
    }

    #[test]
    fn test_no_dependencies_keeps_own_version() {
        let own = TreeVersion::clean("abc");
        assert_eq!(combine_versions("m", own.clone(), &BTreeMap::new()), own);
    }

    #[test]
    fn test_clean_versions_are_hashed() {
        let dependencies = deps(&[("a", TreeVersion::clean("111"))]);
        let combined = combine_versions("m", TreeVersion::clean("abc"), &dependencies);

        assert!(combined.version_string.starts_with("v-"));
        assert_eq!(combined.version_string.len(), 12);
        assert_eq!(combined.dirty_timestamp, None);

        // Deterministic, and sensitive to dependency versions.
        assert_eq!(combine_versions("m", TreeVersion::clean("abc"), &dependencies), combined);
        let changed = deps(&[("a", TreeVersion::clean("222"))]);
        assert_ne!(combine_versions("m", TreeVersion::clean("abc"), &changed), combined);
    }

    #[test]
    fn test_latest_dirty_version_wins() {
        let dependencies = deps(&[
            ("a", TreeVersion::dirty("aaa", 100)),
            ("b", TreeVersion::dirty("bbb", 300)),
        ]);
        let combined = combine_versions("m", TreeVersion::dirty("mmm", 200), &dependencies);

        assert_eq!(combined, TreeVersion::dirty("bbb-300", 300));
    }

    #[tokio::test]
    async fn test_hashing_port_uses_source() {
        let port = HashingVersionControl::new(FixedSource(TreeVersion::clean("abc")));
        let version = port
            .resolve_tree_version(&Module::new("m"), &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(version, TreeVersion::clean("abc"));
        assert_eq!(port.name(), "hashing");
    }

    #[tokio::test]
    async fn test_hashing_port_surfaces_source_errors() {
        let port = HashingVersionControl::new(BrokenSource);
        let err = port
            .resolve_tree_version(&Module::new("m"), &BTreeMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot read tree for m");
    }
}
