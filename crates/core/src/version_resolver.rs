//! Module version resolution with context-scoped caching
//!
//! A module's version covers its own source state and the versions of
//! everything it transitively depends on. Versions are cached under
//! `["moduleVersions", <name>]`, tagged with the module's cache context, so a
//! changed declaration never reuses a version computed for the old one.
//!
//! The dependency closure is resolved in waves: a module joins the wave after
//! the deepest of its dependencies, so every module in a wave can be resolved
//! concurrently and each module is resolved once per call.

use crate::{
    DependencyResolver, Error, Module, ModuleProvider, ModuleVersion, Result, TreeVersion,
    VersionControlPort,
};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, trace};
use trellis_cache::{CacheContext, CacheKey, ContextCache};

/// First segment of every module version cache key.
pub const MODULE_VERSIONS_KEY: &str = "moduleVersions";

/// Cache of resolved module versions.
pub type VersionCache = ContextCache<ModuleVersion>;

/// A dependency to resolve and the names of the modules its version covers.
struct Step {
    module: Arc<Module>,
    covers: BTreeSet<String>,
}

/// Group a topologically ordered closure into waves.
///
/// Every module lands one wave after the latest wave holding one of its build
/// dependencies, so a wave only depends on earlier waves.
fn plan_waves(closure: &[Arc<Module>]) -> Vec<Vec<Step>> {
    let mut waves: Vec<Vec<Step>> = Vec::new();
    let mut levels: HashMap<&str, usize> = HashMap::new();
    let mut covers: HashMap<&str, BTreeSet<String>> = HashMap::new();

    for module in closure {
        let mut level = 0;
        let mut covered = BTreeSet::new();
        for dep in &module.build_dependencies {
            if let Some(&dep_level) = levels.get(dep.as_str()) {
                level = level.max(dep_level + 1);
            }
            covered.insert(dep.clone());
            if let Some(transitive) = covers.get(dep.as_str()) {
                covered.extend(transitive.iter().cloned());
            }
        }

        levels.insert(&module.name, level);
        covers.insert(&module.name, covered.clone());
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(Step {
            module: Arc::clone(module),
            covers: covered,
        });
    }

    waves
}

/// Resolves module versions through the version control port and the cache.
#[derive(Clone)]
pub struct VersionResolver {
    modules: Arc<dyn ModuleProvider>,
    dependencies: DependencyResolver,
    vcs: Arc<dyn VersionControlPort>,
    cache: Arc<VersionCache>,
    parallel: bool,
}

impl VersionResolver {
    /// Create a resolver. Independent dependencies are resolved concurrently.
    #[must_use]
    pub fn new(
        modules: Arc<dyn ModuleProvider>,
        vcs: Arc<dyn VersionControlPort>,
        cache: Arc<VersionCache>,
    ) -> Self {
        Self {
            dependencies: DependencyResolver::new(Arc::clone(&modules)),
            modules,
            vcs,
            cache,
            parallel: true,
        }
    }

    /// Choose between concurrent and sequential resolution of independent dependencies.
    #[must_use]
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The cache key under which a module's version is stored.
    #[must_use]
    pub fn cache_key(module_name: &str) -> CacheKey {
        CacheKey::from([MODULE_VERSIONS_KEY, module_name])
    }

    /// The cache this resolver reads and writes.
    #[must_use]
    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    /// Resolve the version of `module_name`.
    ///
    /// `extra_dependencies` are treated as additional direct dependencies of
    /// the module. Unless `force` is set, a version cached under the module's
    /// current context is returned as is. With `force`, the version is
    /// recomputed and the fresh value replaces the cached one; dependencies
    /// are still resolved through the cache.
    ///
    /// # Errors
    ///
    /// Propagates `NotFound` and `DependencyCycle` from dependency resolution
    /// and any failure raised by the version control port.
    #[instrument(skip(self, extra_dependencies), fields(extra = extra_dependencies.len()))]
    pub async fn resolve_version<S: AsRef<str>>(
        &self,
        module_name: &str,
        extra_dependencies: &[S],
        force: bool,
    ) -> Result<ModuleVersion> {
        let module = self.modules.get_module(module_name)?;
        let context = module.cache_context()?;
        let key = Self::cache_key(&module.name);

        if !force && let Some(cached) = self.cache.get(&key, &context) {
            debug!(module = %module.name, "Using cached module version");
            return Ok(cached);
        }

        let closure = self
            .dependencies
            .dependencies_of(&module, extra_dependencies)?;
        let mut resolved: HashMap<String, ModuleVersion> = HashMap::new();

        for (index, wave) in plan_waves(&closure).into_iter().enumerate() {
            trace!(wave = index, size = wave.len(), "Resolving dependency wave");
            let versions = if self.parallel {
                try_join_all(wave.iter().map(|step| self.resolve_step(step, &resolved))).await?
            } else {
                let mut versions = Vec::with_capacity(wave.len());
                for step in &wave {
                    versions.push(self.resolve_step(step, &resolved).await?);
                }
                versions
            };

            for (step, version) in wave.into_iter().zip(versions) {
                resolved.insert(step.module.name.clone(), version);
            }
        }

        let dependency_versions =
            tree_versions(closure.iter().map(|dep| dep.name.as_str()), &resolved)?;
        self.compute(&module, key, context, dependency_versions, force)
            .await
    }

    /// Resolve one dependency whose own dependencies are already in `resolved`.
    async fn resolve_step(
        &self,
        step: &Step,
        resolved: &HashMap<String, ModuleVersion>,
    ) -> Result<ModuleVersion> {
        let context = step.module.cache_context()?;
        let key = Self::cache_key(&step.module.name);

        if let Some(cached) = self.cache.get(&key, &context) {
            debug!(module = %step.module.name, "Using cached module version");
            return Ok(cached);
        }

        let dependency_versions =
            tree_versions(step.covers.iter().map(String::as_str), resolved)?;
        self.compute(&step.module, key, context, dependency_versions, false)
            .await
    }

    async fn compute(
        &self,
        module: &Module,
        key: CacheKey,
        context: CacheContext,
        dependency_versions: BTreeMap<String, TreeVersion>,
        force: bool,
    ) -> Result<ModuleVersion> {
        let tree = self
            .vcs
            .resolve_tree_version(module, &dependency_versions)
            .await?;
        let version = ModuleVersion::from_tree(tree, dependency_versions);

        debug!(
            module = %module.name,
            version = %version.version_string,
            backend = self.vcs.name(),
            force,
            "Resolved module version"
        );
        self.cache.set(key, version.clone(), context);

        Ok(version)
    }
}

fn tree_versions<'a>(
    names: impl Iterator<Item = &'a str>,
    resolved: &HashMap<String, ModuleVersion>,
) -> Result<BTreeMap<String, TreeVersion>> {
    names
        .map(|name| {
            resolved
                .get(name)
                .map(|version| (name.to_string(), version.tree_version()))
                .ok_or_else(|| Error::module_not_found(name))
        })
        .collect()
}
