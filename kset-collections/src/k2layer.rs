//! K2Layer: an array of K2 units laterally coupled through their primary
//! and antipodal nodes, with aggregate activation histories averaging
//! across the whole layer.

use crate::error::Result;
use crate::k2::{K2Weights, K2};
use k0_core::arena::{NodeArena, NodeId};
use k0_core::config::K0Config;
use k0_core::history::ActivationHistory;
use k0_core::node::K0Connection;
use k0_core::Num;

/// Tag distinguishing lateral primary connections from lateral antipodal
/// ones on a node's inbound list, so a caller can target just the primary
/// lateral weights (as the K3 construction sequence's Gaussian perturbation
/// step does) without touching the antipodal ones.
pub const LATERAL_PRIMARY_TAG: i32 = 1;
pub const LATERAL_ANTIPODAL_TAG: i32 = 2;

#[derive(Debug, Clone)]
pub struct K2Layer {
    arena: NodeArena,
    units: Vec<K2>,
    average_primary_history: ActivationHistory,
    average_antipodal_history: ActivationHistory,
    history_capacity: usize,
    name: Option<String>,
}

impl K2Layer {
    /// Build `n` K2 units sharing one arena, with no lateral connections
    /// installed yet — call [`Self::connect_primary_nodes`] and
    /// [`Self::connect_antipodal_nodes`] afterward.
    pub fn new(n: usize, config: K0Config, weights: K2Weights) -> Result<Self> {
        let arena = NodeArena::new();
        Self::new_in_arena(&arena, n, config, weights)
    }

    /// Build `n` K2 units in an arena shared with other structures outside
    /// this layer (used when a K3 assembly needs to wire the olfactory
    /// bulb's units directly to periglomerular, AON, and DPC nodes living
    /// in the same arena).
    pub fn new_in_arena(arena: &NodeArena, n: usize, config: K0Config, weights: K2Weights) -> Result<Self> {
        let units = (0..n)
            .map(|_| K2::new_in_arena(arena, config, weights))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            arena: arena.clone(),
            units,
            average_primary_history: ActivationHistory::new(config.history_size),
            average_antipodal_history: ActivationHistory::new(config.history_size),
            history_capacity: config.history_size,
            name: None,
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.set_name(format!("{} unit {}", name, i));
        }
        self.name = Some(name);
    }

    pub fn size(&self) -> usize {
        self.units.len()
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn unit(&self, index: usize) -> &K2 {
        &self.units[index]
    }

    pub fn units(&self) -> &[K2] {
        &self.units
    }

    pub fn average_primary_history(&self) -> &ActivationHistory {
        &self.average_primary_history
    }

    pub fn average_antipodal_history(&self) -> &ActivationHistory {
        &self.average_antipodal_history
    }

    /// Reciprocally couple every pair of units' primary nodes. Returns
    /// `false` (and installs nothing) if `weight` is negative — primary
    /// lateral coupling in an olfactory bulb layer is always excitatory.
    /// With more than one unit the weight is divided by `n - 1` so total
    /// lateral drive into a node doesn't scale with layer size.
    pub fn connect_primary_nodes(&self, weight: Num, delay: usize) -> Result<bool> {
        if weight < 0.0 {
            return Ok(false);
        }
        let scaled = if self.units.len() > 1 { weight / (self.units.len() - 1) as Num } else { weight };
        self.connect_all_pairs(
            self.units.iter().map(|u| u.primary_node_id()).collect(),
            scaled,
            delay,
            LATERAL_PRIMARY_TAG,
        );
        Ok(true)
    }

    /// Reciprocally couple every pair of units' antipodal nodes. Returns
    /// `false` if `weight` is positive — antipodal lateral coupling is
    /// always inhibitory.
    pub fn connect_antipodal_nodes(&self, weight: Num, delay: usize) -> Result<bool> {
        if weight > 0.0 {
            return Ok(false);
        }
        let scaled = if self.units.len() > 1 { weight / (self.units.len() - 1) as Num } else { weight };
        self.connect_all_pairs(
            self.units.iter().map(|u| u.antipodal_node_id()).collect(),
            scaled,
            delay,
            LATERAL_ANTIPODAL_TAG,
        );
        Ok(true)
    }

    fn connect_all_pairs(&self, nodes: Vec<NodeId>, weight: Num, delay: usize, tag: i32) {
        let mut arena_nodes = self.arena.borrow_mut();
        for (i, &target) in nodes.iter().enumerate() {
            for (j, &source) in nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                arena_nodes[target.0]
                    .add_inbound_connection(K0Connection::with_tag(source, weight, delay, tag));
            }
        }
    }

    /// Perturb every tagged lateral primary connection by an independent
    /// draw from `sample`.
    pub fn perturb_primary_lateral_weights(&self, mut sample: impl FnMut() -> Num) -> Result<()> {
        let mut nodes = self.arena.borrow_mut();
        for unit in &self.units {
            for connection in nodes[unit.primary_node_id().0].inbound_with_tag_mut(LATERAL_PRIMARY_TAG) {
                connection.perturb_weight(sample())?;
            }
        }
        Ok(())
    }

    pub fn set_external_stimulus(&self, value: Num) {
        for unit in &self.units {
            unit.collection().set_external_stimulus(value);
        }
    }

    pub fn erase_external_stimulus(&self) {
        for unit in &self.units {
            unit.collection().erase_external_stimulus();
        }
    }

    pub fn calculate_next_state(&self) -> Result<()> {
        for unit in &self.units {
            unit.collection().calculate_next_state()?;
        }
        Ok(())
    }

    /// Commit every unit's next state, then push this tick's cross-unit
    /// average primary and antipodal outputs into the layer's aggregate
    /// histories.
    pub fn commit_next_state(&mut self) {
        for unit in &self.units {
            unit.collection().commit_next_state();
        }
        self.update_aggregate_histories();
    }

    pub fn calculate_and_commit_next_state(&mut self) -> Result<()> {
        self.calculate_next_state()?;
        self.commit_next_state();
        Ok(())
    }

    fn update_aggregate_histories(&mut self) {
        let nodes = self.arena.borrow();
        let n = self.units.len() as Num;
        let primary_average: Num =
            self.units.iter().map(|u| nodes[u.primary_node_id().0].current_output()).sum::<Num>() / n;
        let antipodal_average: Num = self
            .units
            .iter()
            .map(|u| nodes[u.antipodal_node_id().0].current_output())
            .sum::<Num>()
            / n;
        drop(nodes);
        self.average_primary_history.put(primary_average);
        self.average_antipodal_history.put(antipodal_average);
    }

    pub fn advance_noise(&self) -> Result<()> {
        for unit in &self.units {
            unit.collection().advance_noise()?;
        }
        Ok(())
    }

    pub fn randomize_states(&self, stddev: Num, seed: u64) {
        for (i, unit) in self.units.iter().enumerate() {
            // Offset the seed per unit so units don't all draw the same
            // sequence while still being fully determined by one seed.
            unit.collection().randomize_states(stddev, seed.wrapping_add(i as u64));
        }
    }

    pub fn set_activity_monitoring(&mut self, window: usize) -> k0_core::Result<()> {
        self.average_primary_history.set_activity_monitoring(window)?;
        self.average_antipodal_history.set_activity_monitoring(window)
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> K2Weights {
        K2Weights { wee: 1.8, wei: 1.0, wie: -2.0, wii: -0.8 }
    }

    #[test]
    fn negative_primary_weight_is_rejected_without_erroring() {
        let layer = K2Layer::new(3, K0Config::default(), weights()).unwrap();
        assert!(!layer.connect_primary_nodes(-0.1, 1).unwrap());
    }

    #[test]
    fn positive_antipodal_weight_is_rejected_without_erroring() {
        let layer = K2Layer::new(3, K0Config::default(), weights()).unwrap();
        assert!(!layer.connect_antipodal_nodes(0.1, 1).unwrap());
    }

    #[test]
    fn lateral_weight_is_divided_by_unit_count_minus_one() {
        let layer = K2Layer::new(3, K0Config::default(), weights()).unwrap();
        layer.connect_primary_nodes(0.2, 1).unwrap();
        let arena = layer.arena();
        let target = layer.unit(0).primary_node_id();
        let nodes = arena.borrow();
        let lateral_weight = nodes[target.0]
            .inbound_connections()
            .iter()
            .find(|c| c.tag == Some(LATERAL_PRIMARY_TAG))
            .unwrap()
            .weight;
        assert!((lateral_weight - 0.1).abs() < 1e-6);
    }

    #[test]
    fn aggregate_history_tracks_cross_unit_average() {
        let mut layer = K2Layer::new(2, K0Config::default(), weights()).unwrap();
        layer.set_external_stimulus(0.4);
        for _ in 0..20 {
            layer.calculate_and_commit_next_state().unwrap();
        }
        assert_eq!(layer.average_primary_history().len(), 20);
    }
}
