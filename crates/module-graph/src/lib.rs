//! Module dependency DAG for trellis.
//!
//! This crate provides a directed acyclic graph (DAG) over named nodes,
//! built with petgraph, and the traversal the dependency resolver needs:
//! closure building from a set of roots, cycle detection that names the
//! offending path, and a topological order whose ties are broken by
//! first-discovery order.
//!
//! # Key Types
//!
//! - [`ModuleGraph`]: The graph structure for building and ordering dependencies
//! - [`ModuleNodeData`]: Trait that node payloads implement to declare their edges
//! - [`GraphNode`]: A node in the graph containing the name and payload
//!
//! # Example
//!
//! ```ignore
//! use trellis_module_graph::{ModuleGraph, ModuleNodeData};
//!
//! #[derive(Clone)]
//! struct Node {
//!     deps: Vec<String>,
//! }
//!
//! impl ModuleNodeData for Node {
//!     fn dependency_names(&self) -> impl Iterator<Item = &str> {
//!         self.deps.iter().map(String::as_str)
//!     }
//! }
//!
//! let mut graph = ModuleGraph::new();
//! graph.add_node("a", Node { deps: vec![] });
//! graph.add_node("b", Node { deps: vec!["a".to_string()] });
//! graph.add_dependency_edges()?;
//!
//! let order = graph.topological_order()?; // [a, b]
//! ```

mod error;
mod graph;
mod traversal;

pub use error::{Error, Result};
pub use graph::{GraphNode, ModuleGraph};
pub use traversal::TopologicalOrder;

/// Trait for payloads that can be stored in a [`ModuleGraph`].
///
/// The iteration order of [`dependency_names`](Self::dependency_names) is
/// significant: it decides the tie-break order of the topological sort.
pub trait ModuleNodeData: Clone {
    /// Returns the names of the nodes this node depends on, in declared order.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}
