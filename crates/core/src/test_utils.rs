//! Shared test utilities for trellis-core tests.
//!
//! Fixtures and a recording [`VersionControlPort`] double, available to unit
//! tests and, through the `test-utils` feature, to integration tests.

use crate::{Error, Module, ModuleSet, Result, TreeVersion, VersionControlPort};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Three modules in a build chain, each providing one service:
/// `module-a`, `module-b -> module-a`, `module-c -> module-b`.
#[must_use]
#[allow(clippy::expect_used)]
pub fn project_a() -> ModuleSet {
    ModuleSet::new([
        Module::new("module-a").with_services(["service-a"]),
        Module::new("module-b")
            .with_build_dependencies(["module-a"])
            .with_services(["service-b"]),
        Module::new("module-c")
            .with_build_dependencies(["module-b"])
            .with_services(["service-c"]),
    ])
    .expect("fixture modules are unique")
}

/// Version control double that records every call.
///
/// Returns `"{module}@{revision}"` as a clean version, where the revision can
/// be bumped to simulate a source change. A yielding double suspends once
/// per call, the way a backend awaiting I/O would.
#[derive(Debug, Default)]
pub struct RecordingVcs {
    calls: Mutex<Vec<String>>,
    revision: AtomicU64,
    failure: Option<String>,
    yielding: bool,
}

impl RecordingVcs {
    /// A double that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A double whose every call fails with an underlying error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// A double that yields to the runtime before answering.
    #[must_use]
    pub fn yielding() -> Self {
        Self {
            yielding: true,
            ..Self::default()
        }
    }

    /// Change the revision reported from now on.
    pub fn set_revision(&self, revision: u64) {
        self.revision.store(revision, Ordering::SeqCst);
    }

    /// Module names passed to the port, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls made to the port.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl VersionControlPort for RecordingVcs {
    async fn resolve_tree_version(
        &self,
        module: &Module,
        _dependency_versions: &BTreeMap<String, TreeVersion>,
    ) -> Result<TreeVersion> {
        if self.yielding {
            tokio::task::yield_now().await;
        }
        self.calls.lock().push(module.name.clone());

        if let Some(message) = &self.failure {
            return Err(Error::underlying(
                format!("Version control failed for {}", module.name),
                message.clone(),
            ));
        }

        Ok(TreeVersion::clean(format!(
            "{}@{}",
            module.name,
            self.revision.load(Ordering::SeqCst)
        )))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
