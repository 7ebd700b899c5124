//! Fixed-step classical Runge-Kutta integration for the K0 ODE.
//!
//! The model only ever needs one fixed-step RK4 integrator shared by every
//! node, so unlike a general-purpose solver this one hardcodes its step
//! size to [`crate::constants::ODE_STEP_SIZE`] rather than accepting an
//! arbitrary `dt`. It still takes the right-hand side as a plain function
//! over a state vector so it composes with any node's net-input closure.

use crate::constants::{Num, ODE_STEP_SIZE};
use crate::error::{K0Error, Result};
use nalgebra::DVector;

/// Function type for the system of ODEs: dy/dt = f(t, y).
pub type OdeFunction<'a> = dyn Fn(Num, &DVector<Num>) -> DVector<Num> + 'a;

/// Fourth-order Runge-Kutta integrator fixed to the model's step size.
#[derive(Debug, Clone, Copy)]
pub struct Rk4Integrator {
    dt: Num,
    max_value: Num,
}

impl Rk4Integrator {
    /// Integrator using the model's standard 0.5 ms step.
    pub fn new() -> Self {
        Self {
            dt: ODE_STEP_SIZE,
            max_value: 1e6,
        }
    }

    /// Perform one RK4 step from `(t, y)` to `(t + dt, y_next)`.
    pub fn step(&self, t: Num, y: &DVector<Num>, f: &OdeFunction) -> Result<DVector<Num>> {
        let k1 = f(t, y);
        self.check_finite(&k1, "k1")?;

        let y2 = y + &k1 * (self.dt / 2.0);
        let k2 = f(t + self.dt / 2.0, &y2);
        self.check_finite(&k2, "k2")?;

        let y3 = y + &k2 * (self.dt / 2.0);
        let k3 = f(t + self.dt / 2.0, &y3);
        self.check_finite(&k3, "k3")?;

        let y4 = y + &k3 * self.dt;
        let k4 = f(t + self.dt, &y4);
        self.check_finite(&k4, "k4")?;

        let y_next = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (self.dt / 6.0);
        self.check_finite(&y_next, "y_next")?;
        self.check_bounds(&y_next, t + self.dt)?;

        Ok(y_next)
    }

    fn check_finite(&self, v: &DVector<Num>, location: &str) -> Result<()> {
        for (i, &val) in v.iter().enumerate() {
            if !val.is_finite() {
                return Err(K0Error::NonFiniteValue {
                    location: format!("{}[{}]", location, i),
                    value: val as f64,
                });
            }
        }
        Ok(())
    }

    fn check_bounds(&self, v: &DVector<Num>, t: Num) -> Result<()> {
        for (i, &val) in v.iter().enumerate() {
            if val.abs() > self.max_value {
                return Err(K0Error::IntegrationError {
                    time: t as f64,
                    reason: format!("value at index {} exceeded bounds: {}", i, val),
                });
            }
        }
        Ok(())
    }
}

impl Default for Rk4Integrator {
    fn default() -> Self {
        Self::new()
    }
}
