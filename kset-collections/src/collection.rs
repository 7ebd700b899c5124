//! `K0Collection`: an ordered, named group of K0 nodes sharing one arena.
//!
//! Every composite structure in this crate — `K1`, `K2`, each unit of a
//! `K2Layer` — is built as a `K0Collection` plus a fixed wiring pattern
//! applied at construction. The collection itself only knows how to hold
//! nodes, fan out uniform operations across them, and clone its internal
//! topology; it has no opinion about what that topology should be.

use crate::error::{KSetError, Result};
use k0_core::arena::{NodeArena, NodeId};
use k0_core::config::K0Config;
use k0_core::node::{K0Connection, K0Node};
use k0_core::rng::gaussian_stream;
use k0_core::Num;

/// An ordered group of K0 nodes, all living in the same [`NodeArena`].
#[derive(Debug, Clone)]
pub struct K0Collection {
    arena: NodeArena,
    node_ids: Vec<NodeId>,
    name: Option<String>,
}

impl K0Collection {
    /// Build a standalone collection of `n` freshly constructed nodes in a
    /// new, private arena.
    pub fn new(n: usize, config: K0Config) -> Result<Self> {
        if n == 0 {
            return Err(KSetError::EmptyCollection { name: "(unnamed)".to_string() });
        }
        config.validate()?;
        let arena = NodeArena::new();
        let node_ids = (0..n)
            .map(|_| arena.insert(K0Node::new(config.history_size).with_sigmoid_q(config.sigmoid_q)))
            .collect();
        let mut collection = Self { arena, node_ids, name: None };
        collection.label_nodes();
        Ok(collection)
    }

    /// Build a collection from nodes already allocated in a shared arena
    /// (used when several collections need to wire directly into each
    /// other's nodes, e.g. a `K2Layer`'s lateral connections or a K3
    /// assembly's cross-layer connections).
    pub fn from_shared_arena(arena: NodeArena, node_ids: Vec<NodeId>) -> Result<Self> {
        if node_ids.is_empty() {
            return Err(KSetError::EmptyCollection { name: "(unnamed)".to_string() });
        }
        let mut collection = Self { arena, node_ids, name: None };
        collection.label_nodes();
        Ok(collection)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
        self.label_nodes();
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    fn label_nodes(&mut self) {
        let name = self.name().to_string();
        let mut nodes = self.arena.borrow_mut();
        for (i, id) in self.node_ids.iter().enumerate() {
            nodes[id.0].set_diagnostic_label(name.clone(), i);
        }
    }

    pub fn size(&self) -> usize {
        self.node_ids.len()
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn node_id(&self, index: usize) -> Result<NodeId> {
        self.node_ids.get(index).copied().ok_or_else(|| KSetError::NodeIndexOutOfRange {
            index,
            name: self.name().to_string(),
            size: self.size(),
        })
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn primary_node_id(&self) -> NodeId {
        self.node_ids[0]
    }

    /// Connect `target`'s node (by index within this collection) to
    /// `source`'s node in another (or the same) collection sharing an
    /// arena.
    pub fn connect(&self, target_index: usize, connection: K0Connection) -> Result<()> {
        let target_id = self.node_id(target_index)?;
        self.arena.borrow_mut()[target_id.0].add_inbound_connection(connection);
        Ok(())
    }

    /// Set external stimulus on the collection's primary node only. Only
    /// the primary node ever receives direct outside input; the rest of
    /// the collection's nodes are driven purely through internal wiring.
    pub fn set_external_stimulus(&self, value: Num) {
        let primary = self.primary_node_id();
        self.arena.borrow_mut()[primary.0].set_external_stimulus(value);
    }

    /// Zero the primary node's external stimulus.
    pub fn erase_external_stimulus(&self) {
        self.set_external_stimulus(0.0);
    }

    /// Compute every node's next state from the arena's currently committed
    /// state, in `node_ids` order. Order within a single collection doesn't
    /// affect the result since nothing is committed until `commit_next_state`.
    pub fn calculate_next_state(&self) -> Result<()> {
        for &id in &self.node_ids {
            self.arena.calculate_next_state(id)?;
        }
        Ok(())
    }

    pub fn commit_next_state(&self) {
        for &id in &self.node_ids {
            self.arena.commit_next_state(id);
        }
    }

    pub fn calculate_and_commit_next_state(&self) -> Result<()> {
        self.calculate_next_state()?;
        self.commit_next_state();
        Ok(())
    }

    /// Advance the noise sample of every node in this collection that has
    /// an installed stream. Nodes with no stream are silently skipped,
    /// since not every node in a collection necessarily carries noise (an
    /// assembly wires noise onto specific nodes, not uniformly).
    pub fn advance_noise(&self) -> Result<()> {
        for &id in &self.node_ids {
            if self.arena.borrow()[id.0].has_noise_stream() {
                self.arena.advance_noise(id)?;
            }
        }
        Ok(())
    }

    /// Draw a fresh Gaussian sample for every node's `x` state.
    pub fn randomize_states(&self, stddev: Num, seed: u64) {
        let mut stream = gaussian_stream(stddev, seed);
        let mut nodes = self.arena.borrow_mut();
        for id in &self.node_ids {
            nodes[id.0].randomize_state(stream());
        }
    }

    /// Clone this collection's internal topology into a fresh, independent
    /// arena: every node is recreated with the same configuration, and only
    /// connections whose source is also inside this collection are carried
    /// over — connections from outside nodes are dropped, exactly as a
    /// standalone copy of a subgraph should behave.
    pub fn clone_subgraph(&self) -> Self {
        let new_arena = NodeArena::new();
        let old_nodes = self.arena.borrow();

        let mut old_to_new = std::collections::HashMap::new();
        let mut new_ids = Vec::with_capacity(self.node_ids.len());
        for &old_id in &self.node_ids {
            let old_node = &old_nodes[old_id.0];
            let new_node = K0Node::new(old_node.activation_history().capacity())
                .with_sigmoid_q(old_node.sigmoid_q());
            let new_id = new_arena.insert(new_node);
            old_to_new.insert(old_id, new_id);
        }
        for &old_id in &self.node_ids {
            new_ids.push(old_to_new[&old_id]);
            let old_node = &old_nodes[old_id.0];
            let new_id = old_to_new[&old_id];
            let mut new_nodes = new_arena.borrow_mut();
            new_nodes[new_id.0].set_external_stimulus(old_node.external_stimulus());
            for connection in old_node.inbound_connections() {
                if let Some(&new_source) = old_to_new.get(&connection.source) {
                    new_nodes[new_id.0].add_inbound_connection(K0Connection {
                        source: new_source,
                        weight: connection.weight,
                        delay: connection.delay,
                        tag: connection.tag,
                    });
                }
            }
        }
        drop(old_nodes);

        let mut clone = Self { arena: new_arena, node_ids: new_ids, name: self.name.clone() };
        clone.label_nodes();
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_zero_size() {
        assert!(K0Collection::new(0, K0Config::default()).is_err());
    }

    #[test]
    fn stimulus_reaches_only_the_primary_node() {
        let collection = K0Collection::new(3, K0Config::default()).unwrap();
        collection.set_external_stimulus(0.7);
        let arena = collection.arena();
        let ids = collection.node_ids();
        assert!((arena.borrow()[ids[0].0].external_stimulus() - 0.7).abs() < 1e-6);
        for &id in &ids[1..] {
            assert!((arena.borrow()[id.0].external_stimulus() - 0.0).abs() < 1e-6);
        }
    }

    #[test]
    fn clone_subgraph_drops_external_connections() {
        let outside = K0Collection::new(1, K0Config::default()).unwrap();
        let inside = K0Collection::new(2, K0Config::default()).unwrap();

        let outside_id = outside.primary_node_id();
        inside.connect(0, K0Connection::new(inside.node_id(1).unwrap(), 0.3, 0)).unwrap();
        inside.connect(0, K0Connection::new(outside_id, 0.9, 0)).unwrap();

        let clone = inside.clone_subgraph();
        let clone_arena = clone.arena();
        let clone_node0 = &clone_arena.borrow()[clone.node_id(0).unwrap().0];
        // Only the internal connection (weight 0.3) should survive; the
        // connection sourced from `outside` must be dropped.
        assert_eq!(clone_node0.inbound_connections().len(), 1);
        assert!((clone_node0.inbound_connections()[0].weight - 0.3).abs() < 1e-6);
    }
}
