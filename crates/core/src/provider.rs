//! Module graph provider
//!
//! The provider is the read-only source of [`Module`] declarations and of the
//! service-to-module mapping. Loading modules from project manifests happens
//! elsewhere; [`ModuleSet`] is the in-memory provider built from the result.

use crate::{Error, Module, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only access to the modules of a project.
pub trait ModuleProvider: Send + Sync {
    /// Look up a module by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module has that name.
    fn get_module(&self, name: &str) -> Result<Arc<Module>>;

    /// Look up the module that provides a service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no module provides that service.
    fn get_service_module(&self, service: &str) -> Result<Arc<Module>>;
}

/// In-memory module provider.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: HashMap<String, Arc<Module>>,
    /// Service name to providing module name
    services: HashMap<String, String>,
    /// Module names in insertion order
    order: Vec<String>,
}

impl ModuleSet {
    /// Build a provider from module declarations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if two modules share a name or two
    /// modules provide the same service.
    pub fn new(modules: impl IntoIterator<Item = Module>) -> Result<Self> {
        let mut set = Self::default();

        for module in modules {
            if set.modules.contains_key(&module.name) {
                return Err(Error::invalid_parameter(format!(
                    "Module '{}' is declared more than once",
                    module.name
                )));
            }

            for service in &module.services {
                if let Some(existing) = set.services.get(service) {
                    return Err(Error::invalid_parameter(format!(
                        "Service '{service}' is provided by both '{existing}' and '{}'",
                        module.name
                    )));
                }
                set.services.insert(service.clone(), module.name.clone());
            }

            set.order.push(module.name.clone());
            set.modules.insert(module.name.clone(), Arc::new(module));
        }

        Ok(set)
    }

    /// Module names in declaration order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set has no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ModuleProvider for ModuleSet {
    fn get_module(&self, name: &str) -> Result<Arc<Module>> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::module_not_found(name))
    }

    fn get_service_module(&self, service: &str) -> Result<Arc<Module>> {
        let module = self
            .services
            .get(service)
            .ok_or_else(|| Error::service_not_found(service))?;
        self.get_module(module)
    }
}
