//! Construction-time configuration for a full K3 assembly.
//!
//! Every weight/delay pair here names the two components it connects
//! (`pg` periglomerular cells, `ob` olfactory bulb, `aon` anterior
//! olfactory nucleus, `pc` prepiriform cortex, `dpc` deep pyramidal cells)
//! and, where the connection targets a unit's antipodal node rather than
//! its primary one, says so explicitly.

use crate::error::{K3Error, Result};
use k0_core::constants::{DEFAULT_SIGMOID_Q, Num};
use kset_collections::K2Weights;
use serde::{Deserialize, Serialize};

/// All tunable parameters of a K3 assembly. A plain data struct with a
/// validator, not a type hierarchy — the same shape `K0Config` and
/// `K2Weights` use one layer down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct K3Config {
    /// Number of PG/OB units (the size of the glomerular array).
    pub num_units: usize,

    /// Lateral coupling weight between PG units' primary nodes, before
    /// dividing by `num_units - 1`.
    pub w_pg_lateral: Num,
    pub d_pg_lateral: usize,

    /// Reciprocal coupling between a PG unit's own primary and secondary
    /// node (each PG unit is a K1 pair, not a lone K0 unit): primary into
    /// secondary and secondary into primary, independently settable but
    /// required to share a sign by the K1 pair itself.
    pub w_pg_intraunit_ps: Num,
    pub w_pg_intraunit_sp: Num,

    /// Weight of a PG unit's drive onto its co-located OB unit.
    pub w_pg_ob: Num,
    pub d_pg_ob: usize,

    /// OB-to-AON lateral olfactory tract weight/delay.
    pub w_ob_aon_lot: Num,
    pub d_ob_aon_lot: usize,

    /// OB-to-PC lateral olfactory tract weight/delay.
    pub w_ob_pc_lot: Num,
    pub d_ob_pc_lot: usize,

    /// AON feedback onto every PG unit's primary node via the medial
    /// olfactory tract.
    pub w_aon_pg_mot: Num,
    pub d_aon_pg_mot: usize,

    /// AON feedback onto OB's antipodal nodes via the medial olfactory
    /// tract.
    pub w_aon_ob_antipodal: Num,
    pub d_aon_ob_antipodal: usize,

    /// PC feedback onto AON's antipodal node.
    pub w_pc_aon_antipodal: Num,
    pub d_pc_aon_antipodal: usize,

    /// PC primary to DPC.
    pub w_pc_dpc: Num,
    pub d_pc_dpc: usize,

    /// DPC to PC's antipodal node. The original model's author flagged this
    /// default as a guess rather than a fit value; treat it as tunable.
    pub w_dpc_pc: Num,
    pub d_dpc_pc: usize,

    /// DPC to OB's antipodal nodes. Also flagged as a guess in the original
    /// model.
    pub w_dpc_ob_antipodal: Num,
    pub d_dpc_ob_antipodal: usize,

    /// Standard deviation of the AON primary node's independent noise
    /// stream.
    pub noise_aon: Num,
    /// Standard deviation of every PG primary node's independent noise
    /// stream.
    pub noise_pg: Num,
    /// Standard deviation of every OB primary node's independent noise
    /// stream.
    pub noise_ob: Num,

    pub ob_unit_config: K2Weights,
    pub aon_unit_config: K2Weights,
    pub pc_unit_config: K2Weights,

    /// OB lateral primary coupling (excitatory, before dividing by
    /// `num_units - 1`).
    pub w_ob_lateral_primary: Num,
    pub d_ob_lateral_primary: usize,
    /// OB lateral antipodal coupling (inhibitory, before dividing).
    pub w_ob_lateral_antipodal: Num,
    pub d_ob_lateral_antipodal: usize,

    /// Standard deviation used to perturb each OB unit's lateral primary
    /// weight at construction time, divided by `num_units - 1` the same way
    /// the weight itself is.
    pub noise_ob_lateral_weights: Num,
    /// Standard deviation used to randomize every node's initial `x` state.
    pub noise_initial_k0_states: Num,

    /// Capacity of OB primary/antipodal, AON primary, and PC primary
    /// histories — the ones external callers actually read from.
    pub output_history_size: usize,
    /// Rolling-variance monitoring window installed on those same output
    /// histories.
    pub output_node_activity_monitoring: usize,
    /// Capacity of every other node's history.
    pub non_output_history_size: usize,

    pub sigmoid_q: Num,

    /// How long to run with zero stimulus immediately after construction,
    /// in milliseconds, letting transients from the randomized initial
    /// states die out before the assembly is presented with anything.
    pub initial_rest_milliseconds: Num,
}

impl K3Config {
    /// Parse a configuration from a JSON document, then validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| K3Error::InvalidConfig {
            reason: format!("malformed configuration JSON: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration to a pretty-printed JSON document.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| K3Error::InvalidConfig {
            reason: format!("failed to serialize configuration: {e}"),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_units == 0 {
            return Err(K3Error::InvalidConfig { reason: "num_units must be at least 1".to_string() });
        }
        self.ob_unit_config.validate().map_err(K3Error::from)?;
        self.aon_unit_config.validate().map_err(K3Error::from)?;
        self.pc_unit_config.validate().map_err(K3Error::from)?;
        if self.w_pg_lateral < 0.0 {
            return Err(K3Error::InvalidConfig {
                reason: "w_pg_lateral must be non-negative (periglomerular coupling is excitatory)".to_string(),
            });
        }
        if self.w_pg_intraunit_ps < 0.0 || self.w_pg_intraunit_sp < 0.0 {
            return Err(K3Error::InvalidConfig {
                reason: "w_pg_intraunit_ps/sp must be non-negative (a PG pair is mutually excitatory)".to_string(),
            });
        }
        if self.w_ob_lateral_primary < 0.0 {
            return Err(K3Error::InvalidConfig {
                reason: "w_ob_lateral_primary must be non-negative".to_string(),
            });
        }
        if self.w_ob_lateral_antipodal > 0.0 {
            return Err(K3Error::InvalidConfig {
                reason: "w_ob_lateral_antipodal must be non-positive".to_string(),
            });
        }
        if self.output_node_activity_monitoring > self.output_history_size {
            return Err(K3Error::InvalidConfig {
                reason: "output_node_activity_monitoring cannot exceed output_history_size".to_string(),
            });
        }
        if self.sigmoid_q <= 0.0 || !self.sigmoid_q.is_finite() {
            return Err(K3Error::InvalidConfig { reason: "sigmoid_q must be positive and finite".to_string() });
        }
        Ok(())
    }
}

impl Default for K3Config {
    /// Five units, matching the reference parameter-search driver this
    /// model was originally tuned against.
    fn default() -> Self {
        Self {
            num_units: 5,

            w_pg_lateral: 0.10,
            d_pg_lateral: 1,

            w_pg_intraunit_ps: 0.20,
            w_pg_intraunit_sp: 0.20,

            w_pg_ob: 1.00,
            d_pg_ob: 1,

            w_ob_aon_lot: 0.15,
            d_ob_aon_lot: 15,

            w_ob_pc_lot: 0.60,
            d_ob_pc_lot: 15,

            w_aon_pg_mot: 0.05,
            d_aon_pg_mot: 17,

            w_aon_ob_antipodal: 0.25,
            d_aon_ob_antipodal: 25,

            w_pc_aon_antipodal: 0.20,
            d_pc_aon_antipodal: 25,

            w_pc_dpc: -0.05,
            d_pc_dpc: 1,

            w_dpc_pc: 0.20,
            d_dpc_pc: 1,

            w_dpc_ob_antipodal: 0.50,
            d_dpc_ob_antipodal: 40,

            noise_aon: 0.10,
            noise_pg: 0.10,
            noise_ob: 0.10,

            ob_unit_config: K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 },
            aon_unit_config: K2Weights { wee: 1.6, wei: 1.6, wie: -1.5, wii: -2.0 },
            pc_unit_config: K2Weights { wee: 1.6, wei: 1.9, wie: -0.2, wii: -1.0 },

            w_ob_lateral_primary: 0.15,
            d_ob_lateral_primary: 1,
            w_ob_lateral_antipodal: -0.10,
            d_ob_lateral_antipodal: 1,

            noise_ob_lateral_weights: 0.05,
            noise_initial_k0_states: 0.05,

            output_history_size: 5000,
            output_node_activity_monitoring: 1000,
            non_output_history_size: 100,

            sigmoid_q: DEFAULT_SIGMOID_Q,
            initial_rest_milliseconds: 500.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(K3Config::default().validate().is_ok());
    }

    #[test]
    fn zero_units_is_rejected() {
        let cfg = K3Config { num_units: 0, ..K3Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn monitoring_window_larger_than_history_is_rejected() {
        let cfg = K3Config { output_node_activity_monitoring: 10_000, ..K3Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn wrong_sign_lateral_weight_is_rejected() {
        let cfg = K3Config { w_ob_lateral_primary: -0.1, ..K3Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_roundtrip_preserves_configuration() {
        let original = K3Config::default();
        let json = original.to_json_string().unwrap();
        let parsed = K3Config::from_json_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(K3Config::from_json_str("{ not json").is_err());
    }
}
