//! Error types for trellis core operations

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error raised by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for trellis operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A malformed or disallowed parameter, such as a config key
    #[error("Invalid parameter: {message}")]
    #[diagnostic(code(trellis::invalid_parameter))]
    InvalidParameter {
        /// What was wrong with the parameter
        message: String,
    },

    /// An unknown module, service or config key
    #[error("No {kind} named '{name}'")]
    #[diagnostic(
        code(trellis::not_found),
        help("Check the name for typos and that it is declared in the project")
    )]
    NotFound {
        /// What kind of thing was looked up (`module`, `service`, `config key`)
        kind: &'static str,
        /// The name that was looked up
        name: String,
    },

    /// The build dependencies form a cycle
    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(trellis::dependency_cycle),
        help("Remove one of the build dependencies along the cycle")
    )]
    DependencyCycle {
        /// Module names along the cycle; the first and last entries are equal
        cycle: Vec<String>,
    },

    /// A failure raised by a collaborator (version control, persistence, ...)
    #[error("{message}")]
    #[diagnostic(code(trellis::underlying))]
    Underlying {
        /// Context describing the failed operation
        message: String,
        /// The collaborator's error
        #[source]
        source: BoxError,
    },
}

/// Discriminant of [`Error`] for callers that branch on the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::InvalidParameter`]
    InvalidParameter,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::DependencyCycle`]
    DependencyCycle,
    /// See [`Error::Underlying`]
    UnderlyingFailure,
}

impl Error {
    /// Create an invalid parameter error
    #[must_use]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a not found error for a module
    #[must_use]
    pub fn module_not_found(name: impl Into<String>) -> Self {
        Self::not_found("module", name)
    }

    /// Create a not found error for a service
    #[must_use]
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::not_found("service", name)
    }

    /// Create a dependency cycle error
    #[must_use]
    pub fn dependency_cycle(cycle: Vec<String>) -> Self {
        Self::DependencyCycle { cycle }
    }

    /// Wrap a collaborator's error with context
    #[must_use]
    pub fn underlying(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Underlying {
            message: message.into(),
            source: source.into(),
        }
    }

    /// The kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DependencyCycle { .. } => ErrorKind::DependencyCycle,
            Self::Underlying { .. } => ErrorKind::UnderlyingFailure,
        }
    }
}

impl From<trellis_module_graph::Error> for Error {
    fn from(error: trellis_module_graph::Error) -> Self {
        match error {
            trellis_module_graph::Error::CycleDetected { cycle } => Self::dependency_cycle(cycle),
            trellis_module_graph::Error::MissingDependencies { missing } => {
                match missing.into_iter().next() {
                    Some((_, dependency)) => Self::module_not_found(dependency),
                    None => Self::invalid_parameter("Missing dependencies reported without a name"),
                }
            }
        }
    }
}

impl From<trellis_cache::Error> for Error {
    fn from(error: trellis_cache::Error) -> Self {
        Self::underlying("Failed to compute cache context", error)
    }
}

/// Result type alias for trellis operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::invalid_parameter("bad key").to_string(),
            "Invalid parameter: bad key"
        );
        assert_eq!(
            Error::module_not_found("module-x").to_string(),
            "No module named 'module-x'"
        );
        assert_eq!(
            Error::dependency_cycle(vec!["a".into(), "b".into(), "a".into()]).to_string(),
            "Dependency cycle detected: a -> b -> a"
        );
    }

    #[test]
    fn test_underlying_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "not a repository");
        let error = Error::underlying("Failed to read tree", io);

        assert_eq!(error.kind(), ErrorKind::UnderlyingFailure);
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "not a repository");
    }

    #[test]
    fn test_graph_errors_convert() {
        let cycle: Error = trellis_module_graph::Error::CycleDetected {
            cycle: vec!["a".into(), "a".into()],
        }
        .into();
        assert_eq!(cycle.kind(), ErrorKind::DependencyCycle);

        let missing: Error = trellis_module_graph::Error::MissingDependencies {
            missing: vec![("b".into(), "ghost".into())],
        }
        .into();
        assert!(matches!(missing, Error::NotFound { kind: "module", ref name } if name == "ghost"));
    }

    #[test]
    fn test_empty_missing_dependencies_never_names_empty_module() {
        let error: Error =
            trellis_module_graph::Error::MissingDependencies { missing: Vec::new() }.into();
        assert_eq!(error.kind(), ErrorKind::InvalidParameter);
        assert!(!matches!(error, Error::NotFound { .. }));
    }
}
