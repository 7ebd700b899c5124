//! # Freeman K3
//!
//! A full K3 assembly: Walter Freeman's model of the olfactory system as a
//! hierarchy of coupled nonlinear oscillators, built on [`k0_core`]'s
//! single-unit dynamics and [`kset_collections`]'s K1/K2/K2Layer
//! compositional layers.
//!
//! ## Overview
//!
//! A [`K3`](assembly::K3) assembly wires together five subsystems sharing
//! one node arena:
//!
//! - **PG** (periglomerular cells): one K1 pair per glomerulus, laterally
//!   coupled to every other PG unit and projecting onto its co-located OB
//!   unit.
//! - **OB** (olfactory bulb): a [`kset_collections::K2Layer`] whose primary
//!   nodes couple laterally (excitatory) and whose antipodal nodes couple
//!   laterally (inhibitory).
//! - **AON** (anterior olfactory nucleus): a single K2 unit receiving the
//!   whole bulb's output via the lateral olfactory tract and feeding back
//!   onto PG and OB via the medial olfactory tract.
//! - **PC** (prepiriform cortex): a single K2 unit, also bulb-driven, whose
//!   antipodal node exchanges activity with DPC.
//! - **DPC** (deep pyramidal cells): a single K0 unit closing the
//!   PC-antipodal feedback loop and feeding back onto OB's antipodal nodes.
//!
//! ## Quick start
//!
//! ```
//! use freeman_k3::{K3, K3Config};
//!
//! let mut k3 = K3::new(K3Config { num_units: 3, ..K3Config::default() }).unwrap();
//! k3.present(20.0, &[0.8, 0.2, 0.1]).unwrap();
//! k3.rest(20.0).unwrap();
//!
//! let bulb_output = k3.ob().average_primary_history();
//! assert!(bulb_output.len() > 0);
//! ```
//!
//! ## Determinism
//!
//! `K3::new` draws its construction-time randomness from OS entropy, so
//! repeated calls never agree. [`K3::with_seed_generator`] instead threads
//! a caller-supplied [`k0_core::rng::SeedGenerator`] through every weight
//! perturbation, state randomization, and noise stream installed during
//! construction — two assemblies built from seed generators producing the
//! same sequence, in the same construction order, produce bit-identical
//! output histories.

pub mod assembly;
pub mod config;
pub mod error;

pub use assembly::K3;
pub use config::K3Config;
pub use error::{K3Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use k0_core::rng::SeedGenerator;

    fn small_config() -> K3Config {
        K3Config {
            num_units: 3,
            output_history_size: 500,
            output_node_activity_monitoring: 100,
            non_output_history_size: 50,
            initial_rest_milliseconds: 20.0,
            ..K3Config::default()
        }
    }

    #[test]
    fn a_presented_pattern_drives_measurable_bulb_output() {
        let mut seeds = SeedGenerator::from_seed(99, 8);
        let mut k3 = K3::with_seed_generator(small_config(), &mut seeds).unwrap();
        let baseline = k3.ob().average_primary_history().variance_over(50).unwrap();
        k3.present(30.0, &[1.0, 0.5, 0.0]).unwrap();
        let variance = k3.ob().average_primary_history().variance_over(50).unwrap();
        assert!(variance > baseline.max(1e-6));
    }

    #[test]
    fn rest_then_present_then_rest_runs_without_error() {
        let mut k3 = K3::new(small_config()).unwrap();
        k3.rest(10.0).unwrap();
        k3.present(10.0, &[0.3, 0.3, 0.3]).unwrap();
        k3.rest(10.0).unwrap();
    }

    #[test]
    fn output_histories_are_capped_at_configured_size() {
        let cfg = K3Config { output_history_size: 64, non_output_history_size: 16, ..small_config() };
        let mut k3 = K3::new(cfg).unwrap();
        k3.present(50.0, &[1.0, 0.0, 0.0]).unwrap();
        assert!(k3.aon().collection().arena().borrow()[k3.aon().primary_node_id().0]
            .activation_history()
            .len()
            <= 64);
    }
}
