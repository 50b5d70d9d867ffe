//! # Galvani Core
//!
//! The numerical core of an interactive circuit simulator.
//!
//! This library provides:
//! - Modified Nodal Analysis (MNA) equation building over a live topology
//!   of batteries, resistors, and current sources
//! - A QR-based linear solve that degrades gracefully on pathological edits
//! - Transient companion-model stepping for capacitors and inductors
//! - A charge transport engine animating discrete visual carriers
//!   consistently with the solved currents
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Topology snapshot, node interning, connected components
//! - [`elements`] - Element models (batteries, resistors, sources, reactive)
//! - [`solver`] - Equation assembly, linear solving, transient stepping
//! - [`transport`] - Carrier animation and branch routing
//!
//! ## Simulation method
//!
//! Once per tick, the external editor supplies a topology snapshot and the
//! core runs a pure solve:
//!
//! 1. Build one KCL equation per node, a reference equation per connected
//!    component, and a constraint equation per battery and zero-resistance
//!    resistor
//! 2. Solve the (slightly overdetermined) system `Ax = z` by QR least
//!    squares
//! 3. Split the solved vector back into node voltages and branch currents
//!
//! Reactive elements are discretized with trapezoidal companion models and
//! may be sub-stepped for accuracy. The resulting per-element currents feed
//! the transport engine, which only ever reads them.

pub mod circuit;
pub mod elements;
pub mod error;
pub mod solver;
pub mod transport;

// Re-export main types for convenience
pub use circuit::{CircuitTopology, ElementId, NodeId};
pub use elements::{Battery, Capacitor, CurrentSource, Element, Inductor, Resistor};
pub use error::{GalvaniError, Result};
pub use solver::{solve, Solution, TransientCircuit};
pub use transport::ChargeTransport;

/// Default simulation tick length in seconds (60 Hz interactive loop).
pub const DEFAULT_TIMESTEP: f64 = 1.0 / 60.0;
