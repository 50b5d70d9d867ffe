//! MNA (Modified Nodal Analysis) solver.
//!
//! Turns a topology snapshot into a solved set of node voltages and branch
//! currents, once per simulation tick:
//!
//! 1. The equation builder emits an ordered list of sparse linear equations
//!    over node-voltage and branch-current unknowns.
//! 2. The linear stage assembles them into a dense matrix and solves by QR
//!    in the least-squares sense (the per-component reference rows make the
//!    system rectangular).
//! 3. [`Solution`] maps the solved vector back to stable node and element
//!    ids for the external model and the transport engine.
//!
//! The solve is a pure function of the snapshot; nothing here subscribes to
//! or mutates external state. Degenerate systems produce an all-zero
//! solution and a log warning instead of an error, so an interactive editor
//! can keep ticking through pathological intermediate topologies.

mod equations;
mod linear;
mod solution;
mod transient;

pub use equations::{build_equations, BranchRef, Equation, EquationSystem, Term};
pub use solution::{BranchCurrent, Solution, APPROX_EQUALS_TOLERANCE};
pub use transient::{TransientCircuit, DEFAULT_SUBDIVISIONS};

use std::collections::HashMap;

use crate::circuit::CircuitTopology;

/// Solve a topology snapshot.
///
/// Never fails: a singular or ill-conditioned system yields the all-zero
/// solution and a log warning, and the interactive loop keeps running.
pub fn solve(topology: &CircuitTopology) -> Solution {
    let system = build_equations(topology);
    let x = linear::solve_or_zero(&system);

    let mut node_voltages = HashMap::with_capacity(system.num_nodes);
    for dense in 0..system.num_nodes {
        node_voltages.insert(topology.node_id(dense), x[dense]);
    }

    let branch_currents = system
        .branches
        .iter()
        .enumerate()
        .map(|(i, branch)| BranchCurrent {
            element: branch.element,
            node0: branch.node0,
            node1: branch.node1,
            current: x[system.num_nodes + i],
        })
        .collect();

    Solution::new(node_voltages, branch_currents)
}
