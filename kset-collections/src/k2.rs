//! K2: a four-node excitatory/inhibitory quad, Freeman's minimal oscillator.

use crate::collection::K0Collection;
use crate::error::{KSetError, Result};
use k0_core::arena::NodeId;
use k0_core::config::K0Config;
use k0_core::node::K0Connection;
use k0_core::Num;
use serde::{Deserialize, Serialize};

/// The four coupling weights of a K2 unit. Nodes 0 and 1 are excitatory,
/// nodes 2 and 3 inhibitory (node 3 is the "antipodal" node used for
/// cross-layer wiring). `wee`/`wei` are excitatory couplings and must stay
/// non-negative; `wie`/`wii` involve an inhibitory source and must stay
/// non-positive, preserving each node's excitatory/inhibitory identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct K2Weights {
    pub wee: Num,
    pub wei: Num,
    pub wie: Num,
    pub wii: Num,
}

impl K2Weights {
    pub fn validate(&self) -> Result<()> {
        if self.wee < 0.0 {
            return Err(sign_err("wee", self.wee, "excitatory-to-excitatory coupling must be non-negative"));
        }
        if self.wei < 0.0 {
            return Err(sign_err("wei", self.wei, "excitatory-to-inhibitory coupling must be non-negative"));
        }
        if self.wie > 0.0 {
            return Err(sign_err("wie", self.wie, "inhibitory-to-excitatory coupling must be non-positive"));
        }
        if self.wii > 0.0 {
            return Err(sign_err("wii", self.wii, "inhibitory-to-inhibitory coupling must be non-positive"));
        }
        Ok(())
    }
}

fn sign_err(name: &str, value: Num, reason: &str) -> KSetError {
    KSetError::SignMismatch {
        a: value as f64,
        b: 0.0,
        context: format!("K2Weights::{name}: {reason}"),
    }
}

/// Tag applied to node 3's inbound connections that came from the
/// `wie`/`wii` slots, so `perturb_weights` can target just those if a
/// caller ever needs to (not currently exercised outside of K2Layer's own
/// lateral tagging, which uses its own tag namespace).
const INTRA_UNIT_TAG: i32 = 0;

/// Four-node excitatory/inhibitory quad with fixed internal wiring:
///
/// ```text
/// node 0 (e) <- node 1 * wee, node 2 * wie, node 3 * wie
/// node 1 (e) <- node 0 * wee, node 3 * wie
/// node 2 (i) <- node 0 * wei, node 3 * wii
/// node 3 (i) <- node 0 * wei, node 1 * wei, node 2 * wii
/// ```
#[derive(Debug, Clone)]
pub struct K2 {
    collection: K0Collection,
}

impl K2 {
    pub fn new(config: K0Config, weights: K2Weights) -> Result<Self> {
        let collection = K0Collection::new(4, config)?;
        Self::wire(collection, weights)
    }

    /// Build a K2 unit out of four freshly allocated nodes in an arena
    /// shared with other units, used by `K2Layer` so lateral connections
    /// can reach across units.
    pub fn new_in_arena(
        arena: &k0_core::arena::NodeArena,
        config: K0Config,
        weights: K2Weights,
    ) -> Result<Self> {
        let ids: Vec<NodeId> = (0..4)
            .map(|_| {
                arena.insert(
                    k0_core::node::K0Node::new(config.history_size).with_sigmoid_q(config.sigmoid_q),
                )
            })
            .collect();
        let collection = K0Collection::from_shared_arena(arena.clone(), ids)?;
        Self::wire(collection, weights)
    }

    fn wire(collection: K0Collection, weights: K2Weights) -> Result<Self> {
        weights.validate()?;
        let n: Vec<NodeId> = (0..4).map(|i| collection.node_id(i).unwrap()).collect();

        collection.connect(0, K0Connection::with_tag(n[1], weights.wee, 0, INTRA_UNIT_TAG))?;
        collection.connect(0, K0Connection::with_tag(n[2], weights.wie, 0, INTRA_UNIT_TAG))?;
        collection.connect(0, K0Connection::with_tag(n[3], weights.wie, 0, INTRA_UNIT_TAG))?;

        collection.connect(1, K0Connection::with_tag(n[0], weights.wee, 0, INTRA_UNIT_TAG))?;
        collection.connect(1, K0Connection::with_tag(n[3], weights.wie, 0, INTRA_UNIT_TAG))?;

        collection.connect(2, K0Connection::with_tag(n[0], weights.wei, 0, INTRA_UNIT_TAG))?;
        collection.connect(2, K0Connection::with_tag(n[3], weights.wii, 0, INTRA_UNIT_TAG))?;

        collection.connect(3, K0Connection::with_tag(n[0], weights.wei, 0, INTRA_UNIT_TAG))?;
        collection.connect(3, K0Connection::with_tag(n[1], weights.wei, 0, INTRA_UNIT_TAG))?;
        collection.connect(3, K0Connection::with_tag(n[2], weights.wii, 0, INTRA_UNIT_TAG))?;

        Ok(Self { collection })
    }

    pub fn collection(&self) -> &K0Collection {
        &self.collection
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.collection.set_name(name);
    }

    pub fn primary_node_id(&self) -> NodeId {
        self.collection.primary_node_id()
    }

    /// Node 3, used for the lateral and cross-layer connections that single
    /// out the inhibitory "deep" node of a unit.
    pub fn antipodal_node_id(&self) -> NodeId {
        self.collection.node_id(3).expect("K2 always has 4 nodes")
    }

    /// Perturb every intra-unit connection's weight by an independent draw
    /// from `sample`, preserving sign.
    pub fn perturb_weights(&self, mut sample: impl FnMut() -> Num) -> Result<()> {
        let mut nodes = self.collection.arena().borrow_mut();
        for &id in self.collection.node_ids() {
            for connection in nodes[id.0].inbound_with_tag_mut(INTRA_UNIT_TAG) {
                connection.perturb_weight(sample())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_weights() -> K2Weights {
        K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 }
    }

    #[test]
    fn valid_weights_construct() {
        assert!(K2::new(K0Config::default(), default_weights()).is_ok());
    }

    #[test]
    fn wrong_sign_excitatory_weight_rejected() {
        let mut weights = default_weights();
        weights.wee = -1.0;
        assert!(K2::new(K0Config::default(), weights).is_err());
    }

    #[test]
    fn wrong_sign_inhibitory_weight_rejected() {
        let mut weights = default_weights();
        weights.wie = 2.0;
        assert!(K2::new(K0Config::default(), weights).is_err());
    }

    #[test]
    fn node_three_has_exactly_three_inbound_connections() {
        let k2 = K2::new(K0Config::default(), default_weights()).unwrap();
        let arena = k2.collection().arena();
        let node3 = k2.antipodal_node_id();
        assert_eq!(arena.borrow()[node3.0].inbound_connections().len(), 3);
    }

    #[test]
    fn stimulated_quad_settles_into_sustained_oscillation() {
        let k2 = K2::new(K0Config::default(), default_weights()).unwrap();
        k2.collection().set_external_stimulus(0.3);
        for _ in 0..500 {
            k2.collection().calculate_and_commit_next_state().unwrap();
        }
        let arena = k2.collection().arena();
        let primary = &arena.borrow()[k2.primary_node_id().0];
        let variance = primary.activation_history().variance_over(100).unwrap();
        assert!(variance > 0.0);
    }
}
