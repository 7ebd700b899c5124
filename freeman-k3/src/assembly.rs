//! The full K3 olfactory model: periglomerular cells (PG), the olfactory
//! bulb (OB), the anterior olfactory nucleus (AON), prepiriform cortex
//! (PC), and deep pyramidal cells (DPC), wired into the fixed topology
//! Freeman's model specifies.

use crate::config::K3Config;
use crate::error::{K3Error, Result};
use k0_core::arena::NodeArena;
use k0_core::config::K0Config;
use k0_core::constants::{ode_milliseconds_to_iters, Num};
use k0_core::node::K0Connection;
use k0_core::rng::{gaussian_stream, SeedGenerator};
use kset_collections::collection::K0Collection;
use kset_collections::k2layer::K2Layer;
use kset_collections::{K1, K2};

/// A complete K3 assembly. Every subcomponent shares one [`NodeArena`], so
/// the cross-layer connections built in [`K3::new`] can reach any node in
/// the whole assembly directly by id.
#[derive(Debug, Clone)]
pub struct K3 {
    arena: NodeArena,
    pg: Vec<K1>,
    ob: K2Layer,
    aon: K2,
    pc: K2,
    dpc: K0Collection,
    config: K3Config,
}

impl K3 {
    /// Build a K3 assembly seeded from fresh OS entropy. Two assemblies
    /// built this way will not produce identical output; use
    /// [`Self::with_seed_generator`] when reproducibility matters.
    pub fn new(config: K3Config) -> Result<Self> {
        let mut seeds = SeedGenerator::new(k0_core::constants::DEFAULT_RNG_SEED_BATCH_SIZE);
        Self::with_seed_generator(config, &mut seeds)
    }

    /// Build a K3 assembly whose every random draw (weight perturbation,
    /// initial state randomization, and every installed noise stream) is
    /// determined by `seeds`. Two assemblies built from seed generators
    /// that produce the same sequence of seeds, in the same construction
    /// order, produce bit-identical output histories.
    pub fn with_seed_generator(config: K3Config, seeds: &mut SeedGenerator) -> Result<Self> {
        config.validate()?;

        let arena = NodeArena::new();
        let output_cfg = K0Config { history_size: config.output_history_size, sigmoid_q: config.sigmoid_q };
        let inner_cfg = K0Config { history_size: config.non_output_history_size, sigmoid_q: config.sigmoid_q };

        let pg: Vec<K1> = (0..config.num_units)
            .map(|_| {
                K1::new_in_arena(&arena, inner_cfg, config.w_pg_intraunit_ps, config.w_pg_intraunit_sp)
            })
            .collect::<kset_collections::Result<_>>()
            .map_err(K3Error::from)?;

        let ob = K2Layer::new_in_arena(&arena, config.num_units, output_cfg, config.ob_unit_config)
            .map_err(K3Error::from)?;
        let aon = K2::new_in_arena(&arena, output_cfg, config.aon_unit_config).map_err(K3Error::from)?;
        let pc = K2::new_in_arena(&arena, output_cfg, config.pc_unit_config).map_err(K3Error::from)?;
        let dpc = K0Collection::from_shared_arena(
            arena.clone(),
            vec![arena.insert(k0_core::node::K0Node::new(inner_cfg.history_size).with_sigmoid_q(inner_cfg.sigmoid_q))],
        )
        .map_err(K3Error::from)?;

        let mut assembly = Self { arena, pg, ob, aon, pc, dpc, config };

        assembly.name_subcomponents();
        assembly.connect_subcomponents(&config);
        assembly.perturb_ob_lateral_weights(seeds);
        assembly.randomize_initial_states(seeds);
        assembly.install_noise_streams(seeds);
        assembly.configure_output_histories()?;
        assembly.rest(config.initial_rest_milliseconds)?;

        Ok(assembly)
    }

    fn name_subcomponents(&mut self) {
        for (i, unit) in self.pg.iter_mut().enumerate() {
            unit.set_name(format!("periglomerular cells (input layer) unit {}", i));
        }
        self.ob.set_name("olfactory bulb (K2 layer)");
        self.aon.set_name("anterior olfactory nucleus");
        self.pc.set_name("prepiriform cortex");
    }

    fn connect_subcomponents(&mut self, config: &K3Config) {
        self.connect_pg_laterally(config);
        self.connect_pg_to_ob(config);
        self.ob.connect_primary_nodes(config.w_ob_lateral_primary, config.d_ob_lateral_primary).ok();
        self.ob.connect_antipodal_nodes(config.w_ob_lateral_antipodal, config.d_ob_lateral_antipodal).ok();
        self.connect_ob_to_aon_and_pc(config);
        self.connect_aon_feedback(config);
        self.connect_pc_feedback(config);
        self.connect_pc_dpc_loop(config);
        self.connect_dpc_to_ob(config);
    }

    fn connect_pg_laterally(&self, config: &K3Config) {
        let n = self.pg.len();
        if n < 2 {
            return;
        }
        let weight = config.w_pg_lateral / (n - 1) as Num;
        let mut nodes = self.arena.borrow_mut();
        for (i, target) in self.pg.iter().enumerate() {
            for (j, source) in self.pg.iter().enumerate() {
                if i == j {
                    continue;
                }
                nodes[target.primary_node_id().0].add_inbound_connection(K0Connection::new(
                    source.primary_node_id(),
                    weight,
                    config.d_pg_lateral,
                ));
            }
        }
    }

    fn connect_pg_to_ob(&self, config: &K3Config) {
        let mut nodes = self.arena.borrow_mut();
        for (pg_unit, ob_unit) in self.pg.iter().zip(self.ob.units()) {
            nodes[ob_unit.primary_node_id().0].add_inbound_connection(K0Connection::new(
                pg_unit.primary_node_id(),
                config.w_pg_ob,
                config.d_pg_ob,
            ));
        }
    }

    fn connect_ob_to_aon_and_pc(&self, config: &K3Config) {
        let mut nodes = self.arena.borrow_mut();
        for ob_unit in self.ob.units() {
            nodes[self.aon.primary_node_id().0].add_inbound_connection(K0Connection::new(
                ob_unit.primary_node_id(),
                config.w_ob_aon_lot,
                config.d_ob_aon_lot,
            ));
            nodes[self.pc.primary_node_id().0].add_inbound_connection(K0Connection::new(
                ob_unit.primary_node_id(),
                config.w_ob_pc_lot,
                config.d_ob_pc_lot,
            ));
        }
    }

    fn connect_aon_feedback(&self, config: &K3Config) {
        let mut nodes = self.arena.borrow_mut();
        for pg_unit in &self.pg {
            nodes[pg_unit.primary_node_id().0].add_inbound_connection(K0Connection::new(
                self.aon.primary_node_id(),
                config.w_aon_pg_mot,
                config.d_aon_pg_mot,
            ));
        }
        for ob_unit in self.ob.units() {
            nodes[ob_unit.antipodal_node_id().0].add_inbound_connection(K0Connection::new(
                self.aon.primary_node_id(),
                config.w_aon_ob_antipodal,
                config.d_aon_ob_antipodal,
            ));
        }
    }

    fn connect_pc_feedback(&self, config: &K3Config) {
        let mut nodes = self.arena.borrow_mut();
        nodes[self.aon.antipodal_node_id().0].add_inbound_connection(K0Connection::new(
            self.pc.primary_node_id(),
            config.w_pc_aon_antipodal,
            config.d_pc_aon_antipodal,
        ));
    }

    fn connect_pc_dpc_loop(&self, config: &K3Config) {
        let dpc_primary = self.dpc.primary_node_id();
        let mut nodes = self.arena.borrow_mut();
        nodes[dpc_primary.0].add_inbound_connection(K0Connection::new(
            self.pc.antipodal_node_id(),
            config.w_pc_dpc,
            config.d_pc_dpc,
        ));
        nodes[self.pc.antipodal_node_id().0].add_inbound_connection(K0Connection::new(
            dpc_primary,
            config.w_dpc_pc,
            config.d_dpc_pc,
        ));
    }

    fn connect_dpc_to_ob(&self, config: &K3Config) {
        let dpc_primary = self.dpc.primary_node_id();
        let mut nodes = self.arena.borrow_mut();
        for ob_unit in self.ob.units() {
            nodes[ob_unit.antipodal_node_id().0].add_inbound_connection(K0Connection::new(
                dpc_primary,
                config.w_dpc_ob_antipodal,
                config.d_dpc_ob_antipodal,
            ));
        }
    }

    fn perturb_ob_lateral_weights(&self, seeds: &mut SeedGenerator) {
        let n = self.ob.size().max(2);
        let stddev = self.config.noise_ob_lateral_weights / (n - 1) as Num;
        let mut stream = gaussian_stream(stddev, seeds.next_seed());
        // Sign-flip rejections are possible but rare at this noise scale;
        // skip a connection rather than aborting construction over one.
        self.ob.perturb_primary_lateral_weights(|| stream()).ok();
    }

    fn randomize_initial_states(&self, seeds: &mut SeedGenerator) {
        let mut stream = gaussian_stream(self.config.noise_initial_k0_states, seeds.next_seed());
        let mut nodes = self.arena.borrow_mut();
        for node in nodes.iter_mut() {
            node.randomize_state(stream());
        }
    }

    fn install_noise_streams(&self, seeds: &mut SeedGenerator) {
        let mut nodes = self.arena.borrow_mut();
        nodes[self.aon.primary_node_id().0]
            .install_noise_stream(Box::new(gaussian_stream(self.config.noise_aon, seeds.next_seed())));
        for pg_unit in &self.pg {
            nodes[pg_unit.primary_node_id().0]
                .install_noise_stream(Box::new(gaussian_stream(self.config.noise_pg, seeds.next_seed())));
        }
        for ob_unit in self.ob.units() {
            nodes[ob_unit.primary_node_id().0]
                .install_noise_stream(Box::new(gaussian_stream(self.config.noise_ob, seeds.next_seed())));
        }
    }

    fn configure_output_histories(&mut self) -> Result<()> {
        let window = self.config.output_node_activity_monitoring;
        {
            let mut nodes = self.arena.borrow_mut();
            nodes[self.aon.primary_node_id().0]
                .activation_history_mut()
                .set_activity_monitoring(window)
                .map_err(kset_collections::KSetError::from)?;
            nodes[self.pc.primary_node_id().0]
                .activation_history_mut()
                .set_activity_monitoring(window)
                .map_err(kset_collections::KSetError::from)?;
        }
        self.ob.set_activity_monitoring(window).map_err(kset_collections::KSetError::from)?;
        Ok(())
    }

    /// One PG/OB/AON/PC/DPC update tick: every subcomponent computes its
    /// next state from the currently committed arena, all subcomponents
    /// commit, then system noise advances for the next tick.
    pub fn step(&mut self) -> Result<()> {
        for pg_unit in &self.pg {
            pg_unit.collection().calculate_next_state().map_err(K3Error::from)?;
        }
        self.ob.calculate_next_state().map_err(K3Error::from)?;
        self.aon.collection().calculate_next_state().map_err(K3Error::from)?;
        self.pc.collection().calculate_next_state().map_err(K3Error::from)?;
        self.dpc.calculate_next_state().map_err(K3Error::from)?;

        for pg_unit in &self.pg {
            pg_unit.collection().commit_next_state();
        }
        self.ob.commit_next_state();
        self.aon.collection().commit_next_state();
        self.pc.collection().commit_next_state();
        self.dpc.commit_next_state();

        self.advance_system_noise()?;
        Ok(())
    }

    /// Only AON's primary node, every PG primary, and every OB primary
    /// carry independent noise streams — PC and DPC are driven purely by
    /// their inputs.
    fn advance_system_noise(&self) -> Result<()> {
        let aon_id = self.aon.primary_node_id();
        self.arena.advance_noise(aon_id).map_err(kset_collections::KSetError::from)?;
        for pg_unit in &self.pg {
            self.arena.advance_noise(pg_unit.primary_node_id()).map_err(kset_collections::KSetError::from)?;
        }
        self.ob.advance_noise().map_err(K3Error::from)?;
        Ok(())
    }

    fn erase_external_stimulus(&self) {
        for pg_unit in &self.pg {
            pg_unit.collection().erase_external_stimulus();
        }
        self.ob.erase_external_stimulus();
    }

    /// Run for `milliseconds` with zero stimulus into PG/OB.
    pub fn rest(&mut self, milliseconds: Num) -> Result<()> {
        self.erase_external_stimulus();
        self.run(milliseconds)
    }

    /// Present `pattern` (one stimulus value per PG/OB unit) for
    /// `milliseconds`, without clearing whatever stimulus was already set.
    pub fn present(&mut self, milliseconds: Num, pattern: &[Num]) -> Result<()> {
        if pattern.len() != self.pg.len() {
            return Err(K3Error::PatternSizeMismatch { expected: self.pg.len(), actual: pattern.len() });
        }
        {
            let mut nodes = self.arena.borrow_mut();
            for (i, &value) in pattern.iter().enumerate() {
                nodes[self.pg[i].primary_node_id().0].set_external_stimulus(value);
                nodes[self.ob.unit(i).primary_node_id().0].set_external_stimulus(value);
            }
        }
        self.run(milliseconds)
    }

    /// Run for `milliseconds`, repeatedly calling [`Self::step`].
    pub fn run(&mut self, milliseconds: Num) -> Result<()> {
        let iters = ode_milliseconds_to_iters(milliseconds);
        for _ in 0..iters {
            self.step()?;
        }
        Ok(())
    }

    pub fn config(&self) -> &K3Config {
        &self.config
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn pg_units(&self) -> &[K1] {
        &self.pg
    }

    pub fn ob(&self) -> &K2Layer {
        &self.ob
    }

    pub fn aon(&self) -> &K2 {
        &self.aon
    }

    pub fn pc(&self) -> &K2 {
        &self.pc
    }

    pub fn dpc(&self) -> &K0Collection {
        &self.dpc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config() -> K3Config {
        K3Config {
            num_units: 3,
            output_history_size: 200,
            output_node_activity_monitoring: 50,
            non_output_history_size: 50,
            initial_rest_milliseconds: 20.0,
            ..K3Config::default()
        }
    }

    #[test]
    fn construction_runs_the_initial_rest_period() {
        let k3 = K3::new(tiny_config()).unwrap();
        let arena = k3.arena();
        let aon_node = &arena.borrow()[k3.aon().primary_node_id().0];
        assert!(aon_node.activation_history().len() > 0);
    }

    #[test]
    fn present_rejects_mismatched_pattern_length() {
        let mut k3 = K3::new(tiny_config()).unwrap();
        let err = k3.present(10.0, &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, K3Error::PatternSizeMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn present_then_rest_runs_without_error() {
        let mut k3 = K3::new(tiny_config()).unwrap();
        k3.present(10.0, &[1.0, 0.0, 0.0]).unwrap();
        k3.rest(10.0).unwrap();
    }

    #[test]
    fn same_seed_generator_yields_identical_output() {
        let mut seeds_a = SeedGenerator::from_seed(1234, 8);
        let mut seeds_b = SeedGenerator::from_seed(1234, 8);
        let mut a = K3::with_seed_generator(tiny_config(), &mut seeds_a).unwrap();
        let mut b = K3::with_seed_generator(tiny_config(), &mut seeds_b).unwrap();
        a.present(5.0, &[1.0, 0.0, 0.0]).unwrap();
        b.present(5.0, &[1.0, 0.0, 0.0]).unwrap();
        let a_out = a.arena().borrow()[a.aon().primary_node_id().0].activation_history().get(0).unwrap();
        let b_out = b.arena().borrow()[b.aon().primary_node_id().0].activation_history().get(0).unwrap();
        assert_eq!(a_out, b_out);
    }

    #[test]
    fn different_seed_generators_diverge() {
        let mut seeds_a = SeedGenerator::from_seed(1, 8);
        let mut seeds_b = SeedGenerator::from_seed(2, 8);
        let a = K3::with_seed_generator(tiny_config(), &mut seeds_a).unwrap();
        let b = K3::with_seed_generator(tiny_config(), &mut seeds_b).unwrap();
        let a_out = a.arena().borrow()[a.aon().primary_node_id().0].activation_history().get(0).unwrap();
        let b_out = b.arena().borrow()[b.aon().primary_node_id().0].activation_history().get(0).unwrap();
        assert_ne!(a_out, b_out);
    }
}
