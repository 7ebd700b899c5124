//! Error types for the full K3 assembly.

use kset_collections::KSetError;
use thiserror::Error;

/// Result type for freeman-k3 operations.
pub type Result<T> = std::result::Result<T, K3Error>;

/// Errors that can occur while configuring or driving a K3 assembly.
#[derive(Error, Debug, Clone)]
pub enum K3Error {
    /// `K3Config::validate` rejected the configuration before any
    /// construction was attempted.
    #[error("invalid K3 configuration: {reason}")]
    InvalidConfig { reason: String },

    /// `present` was called with a pattern whose length doesn't match the
    /// number of PG/OB units.
    #[error("pattern size mismatch: expected {expected} values, got {actual}")]
    PatternSizeMismatch { expected: usize, actual: usize },

    /// Propagated from a K1/K2/K2Layer/K0Collection operation.
    #[error("{0}")]
    KSet(#[from] KSetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_mismatch_reports_both_sizes() {
        let err = K3Error::PatternSizeMismatch { expected: 5, actual: 3 };
        let message = err.to_string();
        assert!(message.contains('5'));
        assert!(message.contains('3'));
    }
}
