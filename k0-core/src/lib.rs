//! Single-unit Freeman K0 oscillator dynamics.
//!
//! A K0 unit is a damped, driven second-order oscillator:
//!
//! ```text
//! dx/dt = y
//! dy/dt = -(a + b) * y + a * b * (u - x)
//! ```
//!
//! where `u` is the unit's net input (external stimulus, noise, and the
//! weighted, delayed output of every node connected into it) and `a`, `b`
//! are fixed decay/rise rates shared by every unit in the model. The
//! committed `x` state passes through an asymmetric sigmoid before being
//! recorded in the unit's activation history, which is what every larger
//! K-set (K1 pairs, K2 quads, K2 layers, the full K3 assembly) actually
//! reads from.
//!
//! # Quick start
//!
//! ```
//! use k0_core::arena::NodeArena;
//! use k0_core::node::{K0Connection, K0Node};
//!
//! let arena = NodeArena::new();
//! let a = arena.insert(K0Node::new(100));
//! let b = arena.insert(K0Node::new(100));
//! arena.borrow_mut()[b.0].add_inbound_connection(K0Connection::new(a, 0.4, 0));
//! arena.borrow_mut()[a.0].set_external_stimulus(1.0);
//!
//! for _ in 0..10 {
//!     arena.calculate_next_state(a).unwrap();
//!     arena.calculate_next_state(b).unwrap();
//!     arena.commit_next_state(a);
//!     arena.commit_next_state(b);
//! }
//! ```
//!
//! # Architecture
//!
//! Nodes never hold references to each other directly. Every connection
//! stores a [`arena::NodeId`], and all nodes sharing a connection graph —
//! whether that's a single `K1` pair or a full K3 assembly's five hundred
//! units — live in one [`arena::NodeArena`]. This sidesteps the reference
//! cycles that a directly-linked graph of feedback connections would
//! otherwise create.
//!
//! Two-phase state update (`calculate_next_state` then `commit_next_state`)
//! is what gives every unit a consistent view of its neighbors: all nodes
//! compute their next state from everyone else's *currently committed*
//! state before any of them commit, so update order within a tick never
//! matters.
//!
//! # Crates built on this one
//!
//! `kset-collections` composes `K0Node`s into `K1`/`K2`/`K2Layer`
//! structures; `freeman-k3` composes those into the full olfactory model.

pub mod arena;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod node;
pub mod rng;
pub mod solvers;

pub use arena::{NodeArena, NodeId};
pub use config::K0Config;
pub use constants::Num;
pub use error::{K0Error, Result};
pub use history::ActivationHistory;
pub use node::{K0Connection, K0Node};
