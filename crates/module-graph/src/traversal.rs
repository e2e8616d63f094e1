//! Traversal result types for module graphs.

use crate::GraphNode;

/// A topologically sorted sequence of nodes.
///
/// Every node appears after all the nodes it depends on. Among orders that
/// satisfy this, the one produced follows first-discovery order from the
/// graph's roots.
pub type TopologicalOrder<T> = Vec<GraphNode<T>>;
