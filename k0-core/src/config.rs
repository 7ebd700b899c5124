//! Construction-time configuration for a single K0 unit.

use crate::constants::{Num, DEFAULT_HISTORY_SIZE, DEFAULT_SIGMOID_Q};
use crate::error::{K0Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters used when constructing a `K0Node`. Plain data plus a
/// validator, not a type hierarchy: every K-set config in this workspace
/// follows the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct K0Config {
    pub history_size: usize,
    pub sigmoid_q: Num,
}

impl K0Config {
    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(K0Error::InvalidParameter {
                parameter: "history_size".to_string(),
                value: 0.0,
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.sigmoid_q.is_finite() || self.sigmoid_q <= 0.0 {
            return Err(K0Error::InvalidParameter {
                parameter: "sigmoid_q".to_string(),
                value: self.sigmoid_q as f64,
                reason: "must be positive and finite".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for K0Config {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            sigmoid_q: DEFAULT_SIGMOID_Q,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(K0Config::default().validate().is_ok());
    }

    #[test]
    fn zero_history_size_is_rejected() {
        let cfg = K0Config { history_size: 0, ..K0Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_sigmoid_q_is_rejected() {
        let cfg = K0Config { sigmoid_q: 0.0, ..K0Config::default() };
        assert!(cfg.validate().is_err());
    }
}
