//! Module dependency resolution
//!
//! Builds a [`ModuleGraph`] over the requested modules and services and
//! returns their dependency closure in topological order.

use crate::{Module, ModuleProvider, Result};
use std::sync::Arc;
use tracing::{debug, instrument};
use trellis_module_graph::{ModuleGraph, ModuleNodeData};

/// Graph payload: a module and the names of the modules it depends on.
#[derive(Debug, Clone)]
struct ModuleNode {
    module: Arc<Module>,
    dependencies: Vec<String>,
}

impl ModuleNodeData for ModuleNode {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(String::as_str)
    }
}

/// Which declared edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edges {
    /// Build dependencies only
    Build,
    /// Build dependencies and the providers of service dependencies
    BuildAndServices,
}

/// Resolves ordered, deduplicated dependency sets from the module graph.
#[derive(Clone)]
pub struct DependencyResolver {
    modules: Arc<dyn ModuleProvider>,
}

impl DependencyResolver {
    /// Create a resolver over a module provider.
    #[must_use]
    pub fn new(modules: Arc<dyn ModuleProvider>) -> Self {
        Self { modules }
    }

    fn node(&self, module: Arc<Module>, edges: Edges, extra: &[String]) -> Result<ModuleNode> {
        let mut dependencies: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if name != module.name && !dependencies.iter().any(|dep| dep == name) {
                dependencies.push(name.to_string());
            }
        };

        for dep in &module.build_dependencies {
            push(dep);
        }
        if edges == Edges::BuildAndServices {
            for service in &module.service_dependencies {
                let provider = self.modules.get_service_module(service)?;
                push(&provider.name);
            }
        }
        for dep in extra {
            push(dep);
        }

        Ok(ModuleNode {
            module,
            dependencies,
        })
    }

    fn load(&self, name: &str, edges: Edges) -> Result<ModuleNode> {
        self.node(self.modules.get_module(name)?, edges, &[])
    }

    /// Resolve the requested modules, the providers of the requested services,
    /// and everything they transitively depend on.
    ///
    /// Both build dependencies and service dependencies are followed; a
    /// service dependency is an edge to the module providing that service.
    /// Each module appears once and after every module it depends on. Ties
    /// follow first-discovery order: requested modules, then service
    /// providers, each walked depth-first through its build dependencies and
    /// then its service dependencies, in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown
    /// module or service, and [`Error::DependencyCycle`](crate::Error::DependencyCycle)
    /// if the dependencies are cyclic.
    #[instrument(skip_all, fields(modules = module_names.len(), services = service_names.len()))]
    pub fn resolve_module_dependencies<S: AsRef<str>>(
        &self,
        module_names: &[S],
        service_names: &[S],
    ) -> Result<Vec<Arc<Module>>> {
        let mut seeds: Vec<String> = module_names
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        for service in service_names {
            let provider = self.modules.get_service_module(service.as_ref())?;
            seeds.push(provider.name.clone());
        }

        let mut graph = ModuleGraph::new();
        graph.build_from_roots(seeds.iter().map(String::as_str), |name| {
            self.load(name, Edges::BuildAndServices)
        })?;
        let order = graph.topological_order()?;

        debug!(resolved = order.len(), "Resolved module dependencies");
        Ok(order.into_iter().map(|node| node.data.module).collect())
    }

    /// Resolve the transitive build dependencies of `module`, with
    /// `extra_dependencies` treated as additional direct dependencies.
    ///
    /// This is the set a module's version covers. The module itself is not
    /// part of the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown
    /// dependency and [`Error::DependencyCycle`](crate::Error::DependencyCycle)
    /// if the module is reachable from its own dependencies.
    pub fn dependencies_of<S: AsRef<str>>(
        &self,
        module: &Arc<Module>,
        extra_dependencies: &[S],
    ) -> Result<Vec<Arc<Module>>> {
        let extra: Vec<String> = extra_dependencies
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        let root = self.node(Arc::clone(module), Edges::Build, &extra)?;

        let mut graph = ModuleGraph::new();
        graph.build_from_roots([module.name.as_str()], |name| {
            if name == module.name {
                Ok(root.clone())
            } else {
                self.load(name, Edges::Build)
            }
        })?;

        Ok(graph
            .topological_order()?
            .into_iter()
            .filter(|node| node.name != module.name)
            .map(|node| node.data.module)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::project_a;
    use crate::{Error, ErrorKind, ModuleSet};

    fn resolver() -> DependencyResolver {
        DependencyResolver::new(Arc::new(project_a()))
    }

    fn names(modules: &[Arc<Module>]) -> Vec<&str> {
        modules.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_resolves_build_dependencies() {
        let modules = resolver()
            .resolve_module_dependencies(&["module-c"], &[])
            .unwrap();
        assert_eq!(names(&modules), vec!["module-a", "module-b", "module-c"]);
    }

    #[test]
    fn test_resolves_service_dependencies() {
        let modules = resolver()
            .resolve_module_dependencies(&[], &["service-b"])
            .unwrap();
        assert_eq!(names(&modules), vec!["module-a", "module-b"]);
    }

    #[test]
    fn test_combines_module_and_service_dependencies() {
        let modules = resolver()
            .resolve_module_dependencies(&["module-b"], &["service-c"])
            .unwrap();
        assert_eq!(names(&modules), vec!["module-a", "module-b", "module-c"]);
    }

    fn service_consumer() -> ModuleSet {
        ModuleSet::new([
            Module::new("a"),
            Module::new("b")
                .with_build_dependencies(["a"])
                .with_services(["service-b"]),
            Module::new("d")
                .with_service_dependencies(["service-b"])
                .with_services(["service-d"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_follows_service_dependencies_to_providers() {
        let resolver = DependencyResolver::new(Arc::new(service_consumer()));

        let by_module = resolver.resolve_module_dependencies(&["d"], &[]).unwrap();
        assert_eq!(names(&by_module), vec!["a", "b", "d"]);

        let by_service = resolver
            .resolve_module_dependencies(&[], &["service-d"])
            .unwrap();
        assert_eq!(names(&by_service), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_unknown_service_dependency_fails() {
        let set =
            ModuleSet::new([Module::new("d").with_service_dependencies(["service-x"])]).unwrap();
        let err = DependencyResolver::new(Arc::new(set))
            .resolve_module_dependencies(&["d"], &[])
            .unwrap_err();
        assert!(
            matches!(err, Error::NotFound { kind: "service", ref name } if name == "service-x")
        );
    }

    #[test]
    fn test_cycle_through_service_dependency_is_reported() {
        let set = ModuleSet::new([
            Module::new("a")
                .with_build_dependencies(["b"])
                .with_services(["service-a"]),
            Module::new("b").with_service_dependencies(["service-a"]),
        ])
        .unwrap();

        let err = DependencyResolver::new(Arc::new(set))
            .resolve_module_dependencies(&["a"], &[])
            .unwrap_err();
        match err {
            Error::DependencyCycle { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_own_service_dependency_is_not_an_edge() {
        let set = ModuleSet::new([Module::new("a")
            .with_services(["service-a"])
            .with_service_dependencies(["service-a"])])
        .unwrap();
        let modules = DependencyResolver::new(Arc::new(set))
            .resolve_module_dependencies(&["a"], &[])
            .unwrap();
        assert_eq!(names(&modules), vec!["a"]);
    }

    #[test]
    fn test_dependencies_of_ignores_service_dependencies() {
        let set = service_consumer();
        let module_d = set.get_module("d").unwrap();
        let deps = DependencyResolver::new(Arc::new(set))
            .dependencies_of::<&str>(&module_d, &[])
            .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_empty_request_resolves_nothing() {
        let modules = resolver()
            .resolve_module_dependencies::<&str>(&[], &[])
            .unwrap();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_unknown_names_fail() {
        let err = resolver()
            .resolve_module_dependencies(&["module-x"], &[])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "module", .. }));

        let err = resolver()
            .resolve_module_dependencies(&[], &["service-x"])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "service", .. }));
    }

    #[test]
    fn test_unknown_transitive_dependency_fails() {
        let set = ModuleSet::new([Module::new("a").with_build_dependencies(["ghost"])]).unwrap();
        let err = DependencyResolver::new(Arc::new(set))
            .resolve_module_dependencies(&["a"], &[])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let set = ModuleSet::new([
            Module::new("a").with_build_dependencies(["b"]),
            Module::new("b").with_build_dependencies(["a"]),
        ])
        .unwrap();

        let err = DependencyResolver::new(Arc::new(set))
            .resolve_module_dependencies(&["a"], &[])
            .unwrap_err();
        match err {
            Error::DependencyCycle { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_dependencies_of_excludes_module() {
        let resolver = resolver();
        let module_c = project_a().get_module("module-c").unwrap();

        let deps = resolver.dependencies_of::<&str>(&module_c, &[]).unwrap();
        assert_eq!(names(&deps), vec!["module-a", "module-b"]);
    }

    #[test]
    fn test_dependencies_of_includes_extras() {
        let set = ModuleSet::new([
            Module::new("a"),
            Module::new("b").with_build_dependencies(["a"]),
            Module::new("tool"),
        ])
        .unwrap();
        let module_b = set.get_module("b").unwrap();
        let resolver = DependencyResolver::new(Arc::new(set));

        let deps = resolver.dependencies_of(&module_b, &["tool", "a"]).unwrap();
        assert_eq!(names(&deps), vec!["a", "tool"]);
    }

    #[test]
    fn test_extra_dependency_back_to_module_is_cycle() {
        let resolver = resolver();
        let module_a = project_a().get_module("module-a").unwrap();

        let err = resolver.dependencies_of(&module_a, &["module-b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyCycle);
    }
}
