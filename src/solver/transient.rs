//! Transient extension: companion-model stepping for reactive elements.
//!
//! Each tick, every capacitor and inductor is replaced by its step-local
//! resistive companion (see [`Capacitor`] and [`Inductor`]), the augmented
//! all-resistive circuit goes through the ordinary build/solve pipeline, and
//! the new capacitor voltage or inductor current is extracted back out as
//! the next tick's initial condition.
//!
//! A macro-step may be split into equal sub-steps to bound integration
//! error; each sub-step feeds its output state into the next.

use std::collections::HashMap;

use crate::circuit::{CircuitTopology, ElementId};
use crate::elements::{Battery, Capacitor, CurrentSource, Inductor, Resistor};

use super::{solve, Solution};

/// Default number of sub-steps for [`TransientCircuit::step_subdivided`]
/// when the caller has no better estimate.
pub const DEFAULT_SUBDIVISIONS: usize = 10;

/// A circuit with reactive elements, stepped tick by tick.
///
/// After every step, each element (resistive or reactive) exposes one scalar
/// signed current through [`TransientCircuit::element_current`]; that is the
/// contract the charge transport engine consumes.
#[derive(Debug)]
pub struct TransientCircuit {
    batteries: Vec<Battery>,
    resistors: Vec<Resistor>,
    current_sources: Vec<CurrentSource>,
    capacitors: Vec<Capacitor>,
    inductors: Vec<Inductor>,
    /// First id of the reserved range for step-local companion elements.
    companion_id_base: usize,
    /// Latest signed current per element, refreshed by every step.
    currents: HashMap<ElementId, f64>,
}

impl TransientCircuit {
    pub fn new(
        batteries: Vec<Battery>,
        resistors: Vec<Resistor>,
        current_sources: Vec<CurrentSource>,
        capacitors: Vec<Capacitor>,
        inductors: Vec<Inductor>,
    ) -> Self {
        let max_id = batteries
            .iter()
            .map(|b| b.id.0)
            .chain(resistors.iter().map(|r| r.id.0))
            .chain(current_sources.iter().map(|c| c.id.0))
            .chain(capacitors.iter().map(|c| c.id.0))
            .chain(inductors.iter().map(|l| l.id.0))
            .max()
            .unwrap_or(0);
        Self {
            batteries,
            resistors,
            current_sources,
            capacitors,
            inductors,
            companion_id_base: max_id + 1,
            currents: HashMap::new(),
        }
    }

    pub fn capacitors(&self) -> &[Capacitor] {
        &self.capacitors
    }

    pub fn inductors(&self) -> &[Inductor] {
        &self.inductors
    }

    /// Latest signed current for any element of this circuit.
    pub fn element_current(&self, element: ElementId) -> Option<f64> {
        self.currents.get(&element).copied()
    }

    /// Advance the circuit by one timestep: companion substitution, solve,
    /// back-extraction.
    pub fn step(&mut self, dt: f64) -> Solution {
        let mut resistors = self.resistors.clone();
        let mut sources = self.current_sources.clone();

        let mut next_companion = self.companion_id_base;
        let mut fresh_id = || {
            let id = ElementId(next_companion);
            next_companion += 1;
            id
        };

        for capacitor in &self.capacitors {
            let (resistor, source) = capacitor.companion(dt, fresh_id(), fresh_id());
            resistors.push(resistor);
            sources.push(source);
        }
        for inductor in &self.inductors {
            let (resistor, source) = inductor.companion(dt, fresh_id(), fresh_id());
            resistors.push(resistor);
            sources.push(source);
        }

        let topology = CircuitTopology::new(self.batteries.clone(), resistors, sources);
        let solution = solve(&topology);

        // Back-extract the new reactive states.
        for capacitor in &mut self.capacitors {
            if let Some(dv) = solution.voltage_difference(capacitor.node0, capacitor.node1) {
                capacitor.update_state(dv, dt);
            }
        }
        for inductor in &mut self.inductors {
            if let Some(dv) = solution.voltage_difference(inductor.node0, inductor.node1) {
                inductor.update_state(dv, dt);
            }
        }

        self.record_currents(&solution);
        solution
    }

    /// Advance one macro-step as `subdivisions` equal sub-steps in sequence,
    /// each feeding its output state into the next. Returns the last
    /// sub-step's solution.
    pub fn step_subdivided(&mut self, dt: f64, subdivisions: usize) -> Solution {
        let n = subdivisions.max(1);
        let sub_dt = dt / n as f64;
        let mut solution = Solution::default();
        for _ in 0..n {
            solution = self.step(sub_dt);
        }
        solution
    }

    fn record_currents(&mut self, solution: &Solution) {
        self.currents.clear();
        for battery in &self.batteries {
            if let Some(i) = solution.solved_current(battery.id) {
                self.currents.insert(battery.id, i);
            }
        }
        for resistor in &self.resistors {
            if let Some(i) = solution.current_for_resistor(resistor) {
                self.currents.insert(resistor.id, i);
            }
        }
        for source in &self.current_sources {
            self.currents.insert(source.id, source.current);
        }
        for capacitor in &self.capacitors {
            self.currents.insert(capacitor.id, capacitor.state.current);
        }
        for inductor in &self.inductors {
            self.currents.insert(inductor.id, inductor.state.current);
        }
    }
}
