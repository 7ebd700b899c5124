//! Shared storage for every `K0Node` in an assembly.
//!
//! Nodes reference each other by [`NodeId`] rather than by pointer, so an
//! arbitrarily tangled web of feedback connections never creates an
//! ownership cycle: every `K0Connection::source` is a plain index into the
//! arena, and the arena itself is the only thing that owns the nodes.

use crate::error::Result;
use crate::node::K0Node;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// An index into a [`NodeArena`]. Stable for the lifetime of the arena;
/// never reused even if a node were removable (nodes are never removed
/// once constructed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Owns every `K0Node` in one or more collections that need to reference
/// each other's nodes directly (a `K2Layer`'s lateral wiring, or a full K3
/// assembly's cross-layer wiring).
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Rc<RefCell<Vec<K0Node>>>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Allocate a new node and return its id.
    pub fn insert(&self, node: K0Node) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<K0Node>> {
        self.nodes.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<K0Node>> {
        self.nodes.borrow_mut()
    }

    /// Compute `id`'s next state from the current committed state of the
    /// whole arena, writing the result into `id`'s shadow state. Takes a
    /// single immutable borrow to read every node's current state, then a
    /// brief mutable borrow to write the one node being updated.
    pub fn calculate_next_state(&self, id: NodeId) -> Result<()> {
        let next = {
            let nodes = self.nodes.borrow();
            nodes[id.0].compute_next_state(nodes.as_slice())?
        };
        self.nodes.borrow_mut()[id.0].shadow_state = next;
        Ok(())
    }

    /// Copy `id`'s shadow state into its committed state and push its
    /// sigmoid output into its activation history.
    pub fn commit_next_state(&self, id: NodeId) {
        self.nodes.borrow_mut()[id.0].commit_next_state();
    }

    /// Draw the next noise sample for `id`, if it has an installed stream.
    pub fn advance_noise(&self, id: NodeId) -> Result<()> {
        self.nodes.borrow_mut()[id.0].advance_noise()
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::K0Node;

    #[test]
    fn inserted_ids_are_sequential() {
        let arena = NodeArena::new();
        let a = arena.insert(K0Node::new(100));
        let b = arena.insert(K0Node::new(100));
        assert_eq!(a.0, 0);
        assert_eq!(b.0, 1);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn cloning_the_arena_shares_storage() {
        let arena = NodeArena::new();
        let id = arena.insert(K0Node::new(100));
        let alias = arena.clone();
        alias.borrow_mut()[id.0].set_external_stimulus(1.0);
        assert_eq!(arena.borrow()[id.0].external_stimulus(), 1.0);
    }
}
