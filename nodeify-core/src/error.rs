//! Error types for graph registration and node access.

use thiserror::Error;

/// Boxed error returned by user computations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = NodeError> = std::result::Result<T, E>;

/// Everything that can go wrong while registering a graph type or
/// reading and writing its nodes.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The analyzer could not make sense of a computation body.
    /// Raised at registration; the type is unusable until fixed.
    #[error("cannot analyze computation of node '{node}': {reason}")]
    UnanalyzableComputation { node: String, reason: String },

    /// A read finished its recompute step and the node still has no value.
    #[error("no valid value set or computable for node '{0}'")]
    ValueNotComputable(String),

    /// A node reads itself, directly or through other nodes.
    #[error("circular dependency: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    /// The same node name was declared twice on one type.
    #[error("node '{0}' is declared more than once")]
    DuplicateNode(String),

    /// Strict registration found a read of something that is not a node.
    #[error("node '{node}' reads '{read}', which is not a declared node")]
    UnknownDependency { node: String, read: String },

    /// An accessor was used against a type that never declared it.
    #[error("node '{0}' is not declared on this type")]
    UnknownNode(String),

    /// The cached value was stored under a different type than requested.
    #[error("node '{node}' does not hold a value of type {expected}")]
    TypeMismatch { node: String, expected: &'static str },

    /// A user computation failed.
    #[error("computation of node '{node}' failed")]
    Computation {
        node: String,
        #[source]
        source: BoxError,
    },
}

impl NodeError {
    /// Wrap a user error raised while computing `node`.
    pub fn computation(node: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Computation {
            node: node.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn circular_dependency_renders_path() {
        let err = NodeError::CircularDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "circular dependency: a -> b -> a");
    }

    #[test]
    fn computation_keeps_source() {
        let err = NodeError::computation("price", "curve is empty");
        assert_eq!(err.to_string(), "computation of node 'price' failed");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("curve is empty"));
    }
}
