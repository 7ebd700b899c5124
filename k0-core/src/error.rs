//! Error types for the K0 oscillator core.

use thiserror::Error;

/// Result type for k0-core operations.
pub type Result<T> = std::result::Result<T, K0Error>;

/// Errors that can occur while constructing or driving a single K0 unit.
#[derive(Error, Debug, Clone)]
pub enum K0Error {
    /// A constructor or setter received a value outside its valid domain.
    #[error("invalid parameter {parameter}: {reason} (value: {value})")]
    InvalidParameter {
        parameter: String,
        value: f64,
        reason: String,
    },

    /// An ODE state component stopped being finite mid-integration.
    #[error("non-finite value encountered in {location}: {value}")]
    NonFiniteValue { location: String, value: f64 },

    /// The RK4 step produced a state outside the integrator's sanity bounds.
    #[error("integration error at t={time}: {reason}")]
    IntegrationError { time: f64, reason: String },

    /// `ActivationHistory::get`/`tail` was asked for more samples than exist.
    #[error("history offset {offset} out of range for capacity {capacity}")]
    HistoryIndexOutOfRange { offset: usize, capacity: usize },

    /// A monitoring window was requested larger than the history's capacity.
    #[error("monitoring window {window} exceeds history capacity {capacity}")]
    MonitoringWindowTooLarge { window: usize, capacity: usize },

    /// `variance()`/`stddev()` was called before `set_activity_monitoring`.
    #[error("activity monitoring was never enabled on this history")]
    MonitoringWindowUndefined,

    /// `advance_noise` was called on a node with no installed noise stream.
    #[error("node {node} has no installed noise stream")]
    NoiseStreamMissing { node: String },

    /// A weight perturbation would flip a connection's excitatory/inhibitory
    /// identity; rejected rather than silently applied.
    #[error("perturbing weight {old} by {delta} would flip its sign")]
    WeightSignFlip { old: f64, delta: f64 },

    /// Reserved for the fatal allocation path documented alongside the other
    /// integration errors; Rust's allocator aborts the process on true OOM,
    /// so this variant is never constructed in practice.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_identifying_fields() {
        let err = K0Error::NoiseStreamMissing {
            node: "node 2 @ olfactory bulb unit 3".to_string(),
        };
        assert!(err.to_string().contains("olfactory bulb unit 3"));
    }
}
