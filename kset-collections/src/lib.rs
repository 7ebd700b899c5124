//! # K-Set Collections
//!
//! Compositional building blocks of the Freeman K-set hierarchy, built on
//! top of the single-unit oscillators in [`k0_core`].
//!
//! ## Overview
//!
//! This library provides the three compositional layers that sit between a
//! lone K0 unit and a full K3 assembly:
//!
//! - **`K0Collection`**: an ordered, named group of nodes sharing one
//!   arena, with primary-node stimulus plus fan-out step/noise/randomize
//!   operations, and subgraph cloning that preserves internal wiring while
//!   dropping external edges.
//! - **`K1`**: a reciprocally-coupled pair, used for the model's
//!   periglomerular cells — sign-checked so a pair can't be half
//!   excitatory and half inhibitory.
//! - **`K2`**: Freeman's minimal four-node oscillator (two excitatory, two
//!   inhibitory), with exactly the fixed wiring his model specifies.
//! - **`K2Layer`**: an array of K2 units laterally coupled through their
//!   primary and antipodal nodes, with aggregate activation histories
//!   averaging the whole layer's output.
//!
//! ## Example: A K2 unit settling into oscillation
//!
//! ```
//! use kset_collections::k2::{K2Weights, K2};
//! use k0_core::config::K0Config;
//!
//! let weights = K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 };
//! let k2 = K2::new(K0Config::default(), weights).unwrap();
//!
//! k2.collection().set_external_stimulus(0.3);
//! for _ in 0..100 {
//!     k2.collection().calculate_and_commit_next_state().unwrap();
//! }
//! ```
//!
//! ## Example: A K2Layer with lateral coupling
//!
//! ```
//! use kset_collections::k2layer::K2Layer;
//! use kset_collections::k2::K2Weights;
//! use k0_core::config::K0Config;
//!
//! let weights = K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 };
//! let mut layer = K2Layer::new(5, K0Config::default(), weights).unwrap();
//! layer.connect_primary_nodes(0.15, 1).unwrap();
//! layer.connect_antipodal_nodes(-0.10, 1).unwrap();
//!
//! layer.set_external_stimulus(0.2);
//! layer.calculate_and_commit_next_state().unwrap();
//! ```
//!
//! ## Architecture
//!
//! Every structure here is, underneath, a [`collection::K0Collection`]:
//! nodes never hold direct references to each other, only
//! [`k0_core::arena::NodeId`]s into a shared [`k0_core::arena::NodeArena`].
//! `K1` and `K2` each allocate their own arena when built standalone, but
//! `K2Layer` allocates one arena shared by every unit so lateral
//! connections can wire directly across units without an intermediate
//! indirection layer.
//!
//! ## Mathematical model
//!
//! Every node still obeys the single K0 ODE from `k0_core`; what this
//! crate adds is topology. A K2 unit's four nodes are wired:
//!
//! ```text
//! node 0 (e) <- node 1 * wee, node 2 * wie, node 3 * wie
//! node 1 (e) <- node 0 * wee, node 3 * wie
//! node 2 (i) <- node 0 * wei, node 3 * wii
//! node 3 (i) <- node 0 * wei, node 1 * wei, node 2 * wii
//! ```
//!
//! and a `K2Layer`'s lateral connections couple every pair of units'
//! primary nodes (excitatory) and every pair of antipodal nodes
//! (inhibitory), each scaled by `1 / (n - 1)` so total lateral drive into
//! any one node doesn't grow with layer size.

pub mod collection;
pub mod error;
pub mod k1;
pub mod k2;
pub mod k2layer;

pub use collection::K0Collection;
pub use error::{KSetError, Result};
pub use k1::K1;
pub use k2::{K2Weights, K2};
pub use k2layer::K2Layer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use k0_core::config::K0Config;

    #[test]
    fn k1_pair_reaches_a_nonzero_steady_state_under_sustained_drive() {
        let k1 = K1::new(K0Config::default(), 0.6, 0.6).unwrap();
        k1.collection().set_external_stimulus(0.5);
        for _ in 0..200 {
            k1.collection().calculate_and_commit_next_state().unwrap();
        }
        let arena = k1.collection().arena();
        let output = arena.borrow()[k1.primary_node_id().0].current_output();
        assert!(output.abs() > 0.0);
    }

    #[test]
    fn k2_layer_of_one_unit_skips_lateral_scaling() {
        let weights = K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 };
        let layer = K2Layer::new(1, K0Config::default(), weights).unwrap();
        // A single-unit layer has nothing to pair laterally; connecting
        // should succeed trivially and install no connections.
        assert!(layer.connect_primary_nodes(0.15, 1).unwrap());
        let arena = layer.arena();
        let node = layer.unit(0).primary_node_id();
        assert!(arena.borrow()[node.0]
            .inbound_connections()
            .iter()
            .all(|c| c.tag != Some(kset_collections_lateral_tag())));
    }

    fn kset_collections_lateral_tag() -> i32 {
        crate::k2layer::LATERAL_PRIMARY_TAG
    }

    #[test]
    fn cloned_k2_subgraph_preserves_fixed_wiring_count() {
        let weights = K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 };
        let k2 = K2::new(K0Config::default(), weights).unwrap();
        let clone = k2.collection().clone_subgraph();
        assert_eq!(clone.size(), 4);
        let arena = clone.arena();
        let node3 = clone.node_id(3).unwrap();
        assert_eq!(arena.borrow()[node3.0].inbound_connections().len(), 3);
    }
}
