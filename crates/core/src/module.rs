//! Module declarations
//!
//! A [`Module`] is a unit of source with declared build- and service-level
//! dependencies. Modules are constructed by whatever loads the project
//! definition and are treated as immutable while dependencies and versions
//! are resolved.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trellis_cache::CacheContext;

/// A declared module of a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Unique name within the project
    pub name: String,

    /// Source directory relative to the project root
    #[serde(default)]
    pub path: PathBuf,

    /// Modules the build step requires, in declared order
    #[serde(default)]
    pub build_dependencies: Vec<String>,

    /// Services the runtime depends on, in declared order
    #[serde(default)]
    pub service_dependencies: Vec<String>,

    /// Services this module provides
    #[serde(default)]
    pub services: Vec<String>,

    /// Free-form declared configuration
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Module {
    /// Create a module with no dependencies, services or configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            ..Self::default()
        }
    }

    /// Set the build dependencies.
    #[must_use]
    pub fn with_build_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the service dependencies.
    #[must_use]
    pub fn with_service_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the provided services.
    #[must_use]
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the declared configuration.
    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    /// Fingerprint of this module's identity and declared state.
    ///
    /// Covers every declared field, so changing any of them yields a
    /// different context and invalidates versions cached under the old one.
    ///
    /// # Errors
    ///
    /// Returns an underlying failure if the declaration cannot be encoded.
    pub fn cache_context(&self) -> Result<CacheContext> {
        Ok(CacheContext::from_serializable(self)?)
    }
}
