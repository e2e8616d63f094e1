//! Error types for module graph operations.

use thiserror::Error;

/// Result type for module graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during module graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in module graph: {}", cycle.join(" -> "))]
    CycleDetected {
        /// Node names along the cycle; the first and last entries are equal.
        cycle: Vec<String>,
    },

    /// One or more nodes depend on nodes that don't exist.
    #[error("Missing dependencies: {}", format_missing(missing))]
    MissingDependencies {
        /// List of (node, missing_dependency) pairs; never empty when raised
        /// by the graph.
        missing: Vec<(String, String)>,
    },
}

fn format_missing(missing: &[(String, String)]) -> String {
    missing
        .iter()
        .map(|(node, dep)| format!("'{node}' depends on missing '{dep}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_path() {
        let error = Error::CycleDetected {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(error.to_string(), "Cycle detected in module graph: a -> b -> a");
    }

    #[test]
    fn test_missing_message_lists_pairs() {
        let error = Error::MissingDependencies {
            missing: vec![("b".into(), "x".into()), ("c".into(), "y".into())],
        };
        assert_eq!(
            error.to_string(),
            "Missing dependencies: 'b' depends on missing 'x', 'c' depends on missing 'y'"
        );
    }
}
