//! Module graph builder using petgraph.
//!
//! This module builds directed acyclic graphs (DAGs) from module declarations
//! and determines the order in which modules must be processed.

use crate::{Error, ModuleNodeData, Result, TopologicalOrder};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// A node in the module graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Name of the node.
    pub name: String,
    /// The node payload.
    pub data: T,
}

/// Module graph for dependency resolution and ordering.
///
/// Edges point from a dependency to its dependent. Roots are the nodes a
/// traversal starts from, in request order; a graph with no explicit roots
/// treats every node as a root in insertion order.
pub struct ModuleGraph<T: ModuleNodeData> {
    /// The directed graph of nodes.
    graph: DiGraph<GraphNode<T>, ()>,
    /// Map from node names to node indices.
    name_to_node: HashMap<String, NodeIndex>,
    /// Traversal roots in request order.
    roots: Vec<NodeIndex>,
}

impl<T: ModuleNodeData> ModuleGraph<T> {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Add a single node to the graph.
    ///
    /// If a node with the same name already exists, returns the existing index
    /// and leaves the stored payload untouched.
    pub fn add_node(&mut self, name: &str, data: T) -> NodeIndex {
        if let Some(&node) = self.name_to_node.get(name) {
            return node;
        }

        let node_index = self.graph.add_node(GraphNode {
            name: name.to_string(),
            data,
        });
        self.name_to_node.insert(name.to_string(), node_index);
        trace!("Added module node '{}'", name);

        node_index
    }

    /// Get a reference to a node by name.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<&GraphNode<T>> {
        self.name_to_node
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Check if a node exists in the graph.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Get the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Names of the traversal roots, in request order.
    #[must_use]
    pub fn root_names(&self) -> Vec<&str> {
        self.roots
            .iter()
            .map(|&idx| self.graph[idx].name.as_str())
            .collect()
    }

    /// Add dependency edges after all nodes have been added.
    ///
    /// Duplicate declarations of the same dependency produce a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependencies`] if any node depends on a node
    /// that is not in the graph. No edges are added in that case.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut missing_deps = Vec::new();
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_name in node.data.dependency_names() {
                if let Some(&dep_node_index) = self.name_to_node.get(dep_name) {
                    edges_to_add.push((dep_node_index, node_index));
                } else {
                    missing_deps.push((node.name.clone(), dep_name.to_string()));
                }
            }
        }

        if !missing_deps.is_empty() {
            return Err(Error::MissingDependencies {
                missing: missing_deps,
            });
        }

        for (from, to) in edges_to_add {
            self.graph.update_edge(from, to, ());
        }

        Ok(())
    }

    /// Build the graph for a set of roots and all their transitive dependencies.
    ///
    /// `load` is called exactly once per reachable name and must return the
    /// payload for that name. Roots are recorded in the order given; repeated
    /// roots are ignored. Intended to be called once on a fresh graph.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `load`, or a graph [`Error`]
    /// converted into `E` if edges cannot be added.
    pub fn build_from_roots<'a, I, F, E>(
        &mut self,
        roots: I,
        mut load: F,
    ) -> std::result::Result<(), E>
    where
        I: IntoIterator<Item = &'a str>,
        F: FnMut(&str) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let roots: Vec<&str> = roots.into_iter().collect();
        debug!(roots = ?roots, "Building module graph");

        // Stack in reverse so the first root is loaded first.
        let mut to_process: Vec<String> = roots.iter().rev().map(|r| (*r).to_string()).collect();
        let mut processed = HashSet::new();

        while let Some(current_name) = to_process.pop() {
            if !processed.insert(current_name.clone()) {
                continue;
            }

            let data = load(&current_name)?;
            let deps: Vec<String> = data.dependency_names().map(String::from).collect();
            self.add_node(&current_name, data);

            for dep in deps.into_iter().rev() {
                if !processed.contains(&dep) {
                    to_process.push(dep);
                }
            }
        }

        for root in roots {
            if let Some(&idx) = self.name_to_node.get(root)
                && !self.roots.contains(&idx)
            {
                self.roots.push(idx);
            }
        }

        self.add_dependency_edges()?;
        Ok(())
    }

    /// Indices of a node's dependencies, in declared order.
    fn dependency_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.graph[index]
            .data
            .dependency_names()
            .filter_map(|name| self.name_to_node.get(name).copied())
            .collect()
    }

    /// Check if the graph has cycles (self-dependencies included).
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Find a dependency cycle, if any.
    ///
    /// The returned path follows "depends on" edges and starts and ends with
    /// the same name, e.g. `["a", "b", "a"]`. When several cycles exist, the
    /// one through the earliest-added node is reported.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let component = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|c| c.len() > 1 || self.graph.contains_edge(c[0], c[0]))
            .filter_map(|c| c.iter().min().copied().map(|start| (start, c)))
            .min_by_key(|(start, _)| *start)?;

        let (start, members) = component;
        let members: HashSet<NodeIndex> = members.into_iter().collect();
        let mut path = vec![start];

        // Every member of a strongly connected component has an edge back
        // into it, so this walk always revisits a node.
        loop {
            let current = *path.last()?;
            let next = self
                .dependency_indices(current)
                .into_iter()
                .find(|idx| members.contains(idx))?;

            if let Some(pos) = path.iter().position(|&idx| idx == next) {
                let mut cycle: Vec<String> = path[pos..]
                    .iter()
                    .map(|&idx| self.graph[idx].name.clone())
                    .collect();
                cycle.push(self.graph[next].name.clone());
                return Some(cycle);
            }
            path.push(next);
        }
    }

    /// Get the nodes in topological order.
    ///
    /// Depth-first from each root in order, visiting dependencies in declared
    /// order and emitting a node once all of its dependencies are emitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming the cycle if the graph is cyclic.
    pub fn topological_order(&self) -> Result<TopologicalOrder<T>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(Error::CycleDetected { cycle });
        }

        let roots: Vec<NodeIndex> = if self.roots.is_empty() {
            self.graph.node_indices().collect()
        } else {
            self.roots.clone()
        };

        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());

        for root in roots {
            if !visited.insert(root) {
                continue;
            }

            let mut stack = vec![(root, self.dependency_indices(root), 0_usize)];
            while let Some((node, deps, next)) = stack.last_mut() {
                if let Some(&dep) = deps.get(*next) {
                    *next += 1;
                    if visited.insert(dep) {
                        let dep_deps = self.dependency_indices(dep);
                        stack.push((dep, dep_deps, 0));
                    }
                } else {
                    order.push(self.graph[*node].clone());
                    stack.pop();
                }
            }
        }

        Ok(order)
    }
}

impl<T: ModuleNodeData> Default for ModuleGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
