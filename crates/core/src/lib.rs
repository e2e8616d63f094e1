//! Core orchestration services for trellis
//!
//! This crate resolves the build dependencies of modules, computes versions
//! that cover a module and everything it depends on, caches those versions
//! per module declaration, and stores namespaced plugin configuration.
//!
//! Everything is reached through [`OrchestrationContext`]:
//!
//! ```no_run
//! # async fn demo(vcs: std::sync::Arc<dyn trellis_core::VersionControlPort>) -> trellis_core::Result<()> {
//! use std::sync::Arc;
//! use trellis_core::{Module, ModuleSet, OrchestrationContext};
//!
//! let modules = ModuleSet::new([
//!     Module::new("api").with_services(["api"]),
//!     Module::new("web").with_build_dependencies(["api"]),
//! ])?;
//! let ctx = OrchestrationContext::builder()
//!     .modules(Arc::new(modules))
//!     .version_control(vcs)
//!     .build()?;
//!
//! let order = ctx.resolve_module_dependencies(&["web"], &[])?;
//! let version = ctx.resolve_version::<&str>("web", &[], false).await?;
//! # let _ = (order, version);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dependencies;
pub mod error;
pub mod module;
pub mod provider;
pub mod vcs;
pub mod version;
pub mod version_resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigKey, ConfigStore, ConfigValue, DeleteResult, Settings};
pub use context::{OrchestrationContext, OrchestrationContextBuilder};
pub use dependencies::DependencyResolver;
pub use error::{BoxError, Error, ErrorKind, Result};
pub use module::Module;
pub use provider::{ModuleProvider, ModuleSet};
pub use vcs::{HashingVersionControl, TreeVersionSource, VersionControlPort, combine_versions};
pub use version::{ModuleVersion, TreeVersion};
pub use version_resolver::{MODULE_VERSIONS_KEY, VersionCache, VersionResolver};
