//! Scalar type and fixed constants of the K0 oscillator's second-order ODE.
//!
//! Every K0 unit integrates the same pair of equations, parameterized only
//! by its external input and sigmoid gain `q`:
//!
//! ```text
//! dx/dt = y
//! dy/dt = -(a + b) * y + a * b * (u - x)
//! ```
//!
//! with `a` the decay rate and `b` the rise rate fixed across the whole
//! model, and `u` the net input (external stimulus plus weighted, delayed
//! neighbor output).

/// Scalar type used throughout the simulation. Single precision is
/// sufficient for the activation ranges this model operates in and halves
/// the memory footprint of every node's activation history.
pub type Num = f32;

/// Integration step size, in milliseconds.
pub const ODE_STEP_SIZE: Num = 0.5;

/// `1 / ODE_STEP_SIZE`, precomputed for the millisecond/iteration conversion.
pub const ODE_STEP_RECIPROCAL: Num = 1.0 / ODE_STEP_SIZE;

/// Decay rate `a` in the K0 second-order ODE.
pub const ODE_A_DECAY_RATE: Num = 0.22;

/// Rise rate `b` in the K0 second-order ODE.
pub const ODE_B_RISE_RATE: Num = 0.72;

/// Default capacity of a freshly constructed `ActivationHistory`.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Default sigmoid gain `q` for a node with no explicit configuration.
pub const DEFAULT_SIGMOID_Q: Num = 5.0;

/// Default batch size for `SeedGenerator`'s entropy refills.
pub const DEFAULT_RNG_SEED_BATCH_SIZE: usize = 32;

/// Convert a duration in milliseconds to a whole number of integration
/// iterations, rounding up so that `present`/`rest` never run for less time
/// than requested.
pub fn ode_milliseconds_to_iters(milliseconds: Num) -> usize {
    (milliseconds * ODE_STEP_RECIPROCAL).ceil() as usize
}

/// Convert a whole number of integration iterations back to milliseconds.
pub fn ode_iters_to_milliseconds(iters: usize) -> Num {
    iters as Num * ODE_STEP_SIZE
}

/// Freeman's asymmetric sigmoid, saturating at `q` above zero and at `-1`
/// below it.
///
/// ```text
/// sigmoid(x, q) = max(q * (1 - exp(-(exp(x) - 1) / q)), -1)
/// ```
pub fn sigmoid(x: Num, q: Num) -> Num {
    let raised = q * (1.0 - (-(x.exp() - 1.0) / q).exp());
    raised.max(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_at_zero_is_zero() {
        assert_relative_eq!(sigmoid(0.0, 5.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn sigmoid_saturates_above_at_q() {
        assert!(sigmoid(50.0, 5.0) <= 5.0);
        assert!(sigmoid(50.0, 5.0) > 4.9);
    }

    #[test]
    fn sigmoid_floors_at_negative_one() {
        assert_relative_eq!(sigmoid(-1000.0, 5.0), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn milliseconds_roundtrip_rounds_up() {
        // 1 ms at a 0.5 ms step is exactly 2 iterations.
        assert_eq!(ode_milliseconds_to_iters(1.0), 2);
        // A fractional duration rounds up rather than truncating.
        assert_eq!(ode_milliseconds_to_iters(0.6), 2);
        assert_relative_eq!(ode_iters_to_milliseconds(2), 1.0);
    }
}
