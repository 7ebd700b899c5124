//! Error types for the compositional K-set layer.

use k0_core::K0Error;
use thiserror::Error;

/// Result type for kset-collections operations.
pub type Result<T> = std::result::Result<T, KSetError>;

/// Errors that can occur while building or driving a K1/K2/K2Layer.
#[derive(Error, Debug, Clone)]
pub enum KSetError {
    /// A pair of reciprocal weights (K1's primary↔secondary, K2's lateral
    /// couplings) were given with mismatched sign.
    #[error("reciprocal weights {a} and {b} must share a sign ({context})")]
    SignMismatch { a: f64, b: f64, context: String },

    /// A collection was asked to do something that requires at least one
    /// node.
    #[error("collection {name} has no nodes")]
    EmptyCollection { name: String },

    /// An index into a collection's node list was out of range.
    #[error("node index {index} out of range for collection {name} of size {size}")]
    NodeIndexOutOfRange { index: usize, name: String, size: usize },

    /// Propagated from a single K0 unit.
    #[error("{0}")]
    Node(#[from] K0Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_error_propagates_through_from() {
        let k0_err = K0Error::MonitoringWindowUndefined;
        let kset_err: KSetError = k0_err.into();
        assert!(matches!(kset_err, KSetError::Node(_)));
    }
}
