//! K1: a reciprocally-coupled pair of K0 units.

use crate::collection::K0Collection;
use crate::error::{KSetError, Result};
use k0_core::config::K0Config;
use k0_core::node::K0Connection;
use k0_core::Num;

/// Size-2 collection with a primary and secondary node, coupled both ways.
/// The two coupling weights must share a sign: a K1 pair is either mutually
/// excitatory or mutually inhibitory, never a mix.
#[derive(Debug, Clone)]
pub struct K1 {
    collection: K0Collection,
}

impl K1 {
    /// `w_primary_secondary` is the weight of the primary's input into the
    /// secondary; `w_secondary_primary` is the reverse.
    pub fn new(
        config: K0Config,
        w_primary_secondary: Num,
        w_secondary_primary: Num,
    ) -> Result<Self> {
        let collection = K0Collection::new(2, config)?;
        Self::wire(collection, w_primary_secondary, w_secondary_primary)
    }

    /// Build a K1 pair out of two freshly allocated nodes in an arena
    /// shared with other structures (used when a K1 needs to be wired
    /// directly to nodes outside its own pair, e.g. a periglomerular unit's
    /// olfactory bulb counterpart).
    pub fn new_in_arena(
        arena: &k0_core::arena::NodeArena,
        config: K0Config,
        w_primary_secondary: Num,
        w_secondary_primary: Num,
    ) -> Result<Self> {
        let ids: Vec<_> = (0..2)
            .map(|_| {
                arena.insert(
                    k0_core::node::K0Node::new(config.history_size).with_sigmoid_q(config.sigmoid_q),
                )
            })
            .collect();
        let collection = K0Collection::from_shared_arena(arena.clone(), ids)?;
        Self::wire(collection, w_primary_secondary, w_secondary_primary)
    }

    fn wire(collection: K0Collection, w_primary_secondary: Num, w_secondary_primary: Num) -> Result<Self> {
        if w_primary_secondary != 0.0
            && w_secondary_primary != 0.0
            && w_primary_secondary.signum() != w_secondary_primary.signum()
        {
            return Err(KSetError::SignMismatch {
                a: w_primary_secondary as f64,
                b: w_secondary_primary as f64,
                context: "K1 primary/secondary coupling".to_string(),
            });
        }

        let primary = collection.node_id(0)?;
        let secondary = collection.node_id(1)?;
        collection.connect(1, K0Connection::new(primary, w_primary_secondary, 0))?;
        collection.connect(0, K0Connection::new(secondary, w_secondary_primary, 0))?;

        Ok(Self { collection })
    }

    pub fn collection(&self) -> &K0Collection {
        &self.collection
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.collection.set_name(name);
    }

    pub fn primary_node_id(&self) -> k0_core::arena::NodeId {
        self.collection.primary_node_id()
    }

    pub fn secondary_node_id(&self) -> k0_core::arena::NodeId {
        self.collection.node_id(1).expect("K1 always has a secondary node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_signs() {
        let result = K1::new(K0Config::default(), 0.5, -0.5);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_same_sign_weights() {
        let k1 = K1::new(K0Config::default(), 0.5, 0.3);
        assert!(k1.is_ok());
    }

    #[test]
    fn mutual_excitation_amplifies_an_impulse() {
        let k1 = K1::new(K0Config::default(), 0.8, 0.8).unwrap();
        k1.collection().set_external_stimulus(1.0);
        for _ in 0..50 {
            k1.collection().calculate_and_commit_next_state().unwrap();
        }
        k1.collection().erase_external_stimulus();
        let arena = k1.collection().arena();
        let primary_output = arena.borrow()[k1.primary_node_id().0].current_output();
        assert!(primary_output.abs() > 0.0);
    }
}
