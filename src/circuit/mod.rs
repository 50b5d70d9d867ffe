//! Circuit topology representation.
//!
//! The [`CircuitTopology`] is an immutable per-tick snapshot supplied by the
//! external editor; the solver and the transport engine both read it, nothing
//! in the core mutates it.

mod graph;
mod types;

pub use graph::CircuitTopology;
pub use types::{BranchIndex, ElementId, NodeId, Unknown};
