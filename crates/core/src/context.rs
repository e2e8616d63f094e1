//! Orchestration context exposed to plugins
//!
//! [`OrchestrationContext`] ties together the module provider, the version
//! control port, the version cache and the config store. It holds no state
//! of its own beyond those handles.

use crate::config::{ConfigStore, ConfigValue, DeleteResult, Settings};
use crate::{
    DependencyResolver, Error, Module, ModuleProvider, ModuleVersion, Result, VersionCache,
    VersionControlPort, VersionResolver,
};
use std::sync::Arc;

/// Builder for [`OrchestrationContext`]
#[derive(Default)]
pub struct OrchestrationContextBuilder {
    modules: Option<Arc<dyn ModuleProvider>>,
    version_control: Option<Arc<dyn VersionControlPort>>,
    cache: Option<Arc<VersionCache>>,
    config_store: Option<ConfigStore>,
    settings: Settings,
}

impl OrchestrationContextBuilder {
    /// Creates a new builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the module provider (required)
    #[must_use]
    pub fn modules(mut self, modules: Arc<dyn ModuleProvider>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Set the version control backend (required)
    #[must_use]
    pub fn version_control(mut self, vcs: Arc<dyn VersionControlPort>) -> Self {
        self.version_control = Some(vcs);
        self
    }

    /// Share an existing version cache
    #[must_use]
    pub fn cache(mut self, cache: Arc<VersionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a specific config store instead of the one `settings` describes
    #[must_use]
    pub fn config_store(mut self, store: ConfigStore) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Set the core settings
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the module provider or the
    /// version control backend is missing, and propagates failures opening a
    /// file-backed config store.
    pub fn build(self) -> Result<OrchestrationContext> {
        let modules = self
            .modules
            .ok_or_else(|| Error::invalid_parameter("A module provider is required"))?;
        let vcs = self
            .version_control
            .ok_or_else(|| Error::invalid_parameter("A version control backend is required"))?;
        let cache = self.cache.unwrap_or_default();
        let config = match self.config_store {
            Some(store) => store,
            None => self.settings.config_store()?,
        };

        tracing::debug!(
            backend = vcs.name(),
            parallel = self.settings.parallel_version_resolution,
            "Built orchestration context"
        );

        Ok(OrchestrationContext {
            dependencies: DependencyResolver::new(Arc::clone(&modules)),
            versions: VersionResolver::new(Arc::clone(&modules), vcs, cache)
                .with_parallelism(self.settings.parallel_version_resolution),
            modules,
            config,
            settings: self.settings,
        })
    }
}

/// Façade over module lookup, dependency resolution, versioning and config
#[derive(Clone)]
pub struct OrchestrationContext {
    modules: Arc<dyn ModuleProvider>,
    dependencies: DependencyResolver,
    versions: VersionResolver,
    config: ConfigStore,
    settings: Settings,
}

impl OrchestrationContext {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> OrchestrationContextBuilder {
        OrchestrationContextBuilder::new()
    }

    /// Look up a module by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown module.
    pub fn get_module(&self, name: &str) -> Result<Arc<Module>> {
        self.modules.get_module(name)
    }

    /// Look up the module providing a service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown service.
    pub fn get_service_module(&self, service: &str) -> Result<Arc<Module>> {
        self.modules.get_service_module(service)
    }

    /// Store a config value. See [`ConfigStore::set_config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key.
    pub fn set_config<S: AsRef<str>>(&self, key: &[S], value: impl Into<String>) -> Result<()> {
        self.config.set_config(key, value)
    }

    /// Read a config value. See [`ConfigStore::get_config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key and
    /// [`Error::NotFound`] if nothing is stored there.
    pub fn get_config<S: AsRef<str>>(&self, key: &[S]) -> Result<ConfigValue> {
        self.config.get_config(key)
    }

    /// Delete a config value. See [`ConfigStore::delete_config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for an invalid key.
    pub fn delete_config<S: AsRef<str>>(&self, key: &[S]) -> Result<DeleteResult> {
        self.config.delete_config(key)
    }

    /// Resolve the requested modules and service providers together with
    /// their build and service dependencies, dependencies first.
    ///
    /// # Errors
    ///
    /// See [`DependencyResolver::resolve_module_dependencies`].
    pub fn resolve_module_dependencies<S: AsRef<str>>(
        &self,
        module_names: &[S],
        service_names: &[S],
    ) -> Result<Vec<Arc<Module>>> {
        self.dependencies
            .resolve_module_dependencies(module_names, service_names)
    }

    /// Resolve the version of a module. See [`VersionResolver::resolve_version`].
    ///
    /// # Errors
    ///
    /// Propagates `NotFound`, `DependencyCycle` and version control failures.
    pub async fn resolve_version<S: AsRef<str>>(
        &self,
        module_name: &str,
        extra_dependencies: &[S],
        force: bool,
    ) -> Result<ModuleVersion> {
        self.versions
            .resolve_version(module_name, extra_dependencies, force)
            .await
    }

    /// Drop the cached version of a module, returning whether one was cached.
    pub fn invalidate_version(&self, module_name: &str) -> bool {
        self.versions
            .cache()
            .invalidate(&VersionResolver::cache_key(module_name))
    }

    /// The version cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<VersionCache> {
        self.versions.cache()
    }

    /// The config store.
    #[must_use]
    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    /// The settings the context was built with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_utils::{RecordingVcs, project_a};

    #[test]
    fn test_build_requires_modules_and_vcs() {
        let err = OrchestrationContext::builder()
            .version_control(Arc::new(RecordingVcs::new()))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = OrchestrationContext::builder()
            .modules(Arc::new(project_a()))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_lookups() {
        let ctx = OrchestrationContext::builder()
            .modules(Arc::new(project_a()))
            .version_control(Arc::new(RecordingVcs::new()))
            .build()
            .unwrap();

        assert_eq!(ctx.get_module("module-b").unwrap().name, "module-b");
        assert_eq!(ctx.get_service_module("service-c").unwrap().name, "module-c");
        assert!(ctx.settings().parallel_version_resolution);
        assert!(ctx.cache().is_empty());
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(VersionCache::new());
        let ctx = OrchestrationContext::builder()
            .modules(Arc::new(project_a()))
            .version_control(Arc::new(RecordingVcs::new()))
            .cache(Arc::clone(&cache))
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(ctx.cache(), &cache));
    }
}
