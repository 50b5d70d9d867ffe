//! Reactive elements: Capacitor, Inductor.
//!
//! Capacitors and inductors are not native MNA unknowns. Each timestep they
//! are replaced by a resistive companion model derived from the trapezoidal
//! rule, in Norton form (an equivalent resistor in parallel with a history
//! current source), so the companion introduces no extra nodes or branches.
//!
//! Capacitor: `i(n) = G*v(n) - I_hist` with `G = 2C/dt` and
//! `I_hist = G*v(n-1) + i(n-1)`.
//!
//! Inductor: `i(n) = v(n)/R + I_hist` with `R = 2L/dt` and
//! `I_hist = i(n-1) + v(n-1)/R`.

use crate::circuit::{ElementId, NodeId};
use crate::error::{GalvaniError, Result};

use super::check_terminals;
use super::linear::Resistor;
use super::sources::CurrentSource;

/// Companion state carried across timesteps: the element's voltage and
/// current at the end of the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompanionState {
    /// Voltage across the element, `V(node0) - V(node1)`.
    pub voltage: f64,
    /// Current through the element, measured from `node0` to `node1`.
    pub current: f64,
}

/// A capacitor, stepped via its trapezoidal companion model.
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub capacitance: f64,
    pub state: CompanionState,
}

impl Capacitor {
    /// Create a new capacitor with zero initial state. Fails fast on equal
    /// terminals or a non-positive or non-finite capacitance.
    pub fn new(id: ElementId, node0: NodeId, node1: NodeId, capacitance: f64) -> Result<Self> {
        check_terminals("capacitor", node0, node1)?;
        if !capacitance.is_finite() || capacitance <= 0.0 {
            return Err(GalvaniError::invalid_element(
                "capacitor",
                format!("capacitance must be finite and > 0, got {capacitance}"),
            ));
        }
        Ok(Self {
            id,
            node0,
            node1,
            capacitance,
            state: CompanionState::default(),
        })
    }

    /// Set the initial condition (voltage across the plates).
    pub fn with_initial_voltage(mut self, voltage: f64) -> Self {
        self.state.voltage = voltage;
        self
    }

    /// Companion conductance `2C/dt`.
    pub fn companion_conductance(&self, dt: f64) -> f64 {
        2.0 * self.capacitance / dt
    }

    /// History current `G*v_prev + i_prev`, injected into `node0`.
    pub fn history_current(&self, dt: f64) -> f64 {
        self.companion_conductance(dt) * self.state.voltage + self.state.current
    }

    /// Build the step-local companion pair: a resistor `dt/(2C)` between the
    /// terminals, and a current source pushing the history current into
    /// `node0` (oriented `node1 -> node0`).
    pub fn companion(&self, dt: f64, resistor_id: ElementId, source_id: ElementId) -> (Resistor, CurrentSource) {
        let resistor = Resistor {
            id: resistor_id,
            node0: self.node0,
            node1: self.node1,
            resistance: dt / (2.0 * self.capacitance),
        };
        let source = CurrentSource {
            id: source_id,
            node0: self.node1,
            node1: self.node0,
            current: self.history_current(dt),
        };
        (resistor, source)
    }

    /// Store the post-solve voltage as the next step's initial condition,
    /// deriving the new current from the trapezoidal relation. Non-finite
    /// extractions are discarded so a pathological solve cannot poison
    /// subsequent ticks.
    pub fn update_state(&mut self, v_new: f64, dt: f64) {
        let i_new = self.companion_conductance(dt) * v_new - self.history_current(dt);
        if !v_new.is_finite() || !i_new.is_finite() {
            log::warn!(
                "capacitor {}: non-finite companion extraction (v={v_new}, i={i_new}), keeping previous state",
                self.id
            );
            return;
        }
        self.state.voltage = v_new;
        self.state.current = i_new;
    }
}

/// An inductor, stepped via its trapezoidal companion model.
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    pub id: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub inductance: f64,
    pub state: CompanionState,
}

impl Inductor {
    /// Create a new inductor with zero initial state. Fails fast on equal
    /// terminals or a non-positive or non-finite inductance.
    pub fn new(id: ElementId, node0: NodeId, node1: NodeId, inductance: f64) -> Result<Self> {
        check_terminals("inductor", node0, node1)?;
        if !inductance.is_finite() || inductance <= 0.0 {
            return Err(GalvaniError::invalid_element(
                "inductor",
                format!("inductance must be finite and > 0, got {inductance}"),
            ));
        }
        Ok(Self {
            id,
            node0,
            node1,
            inductance,
            state: CompanionState::default(),
        })
    }

    /// Set the initial condition (current through the winding).
    pub fn with_initial_current(mut self, current: f64) -> Self {
        self.state.current = current;
        self
    }

    /// Companion resistance `2L/dt`.
    pub fn companion_resistance(&self, dt: f64) -> f64 {
        2.0 * self.inductance / dt
    }

    /// History current `i_prev + v_prev/R`, carried from `node0` to `node1`.
    pub fn history_current(&self, dt: f64) -> f64 {
        self.state.current + self.state.voltage / self.companion_resistance(dt)
    }

    /// Build the step-local companion pair: a resistor `2L/dt` between the
    /// terminals, and a current source carrying the history current from
    /// `node0` to `node1`.
    pub fn companion(&self, dt: f64, resistor_id: ElementId, source_id: ElementId) -> (Resistor, CurrentSource) {
        let resistor = Resistor {
            id: resistor_id,
            node0: self.node0,
            node1: self.node1,
            resistance: self.companion_resistance(dt),
        };
        let source = CurrentSource {
            id: source_id,
            node0: self.node0,
            node1: self.node1,
            current: self.history_current(dt),
        };
        (resistor, source)
    }

    /// Store the post-solve current as the next step's initial condition.
    /// Non-finite extractions are discarded, as for the capacitor.
    pub fn update_state(&mut self, v_new: f64, dt: f64) {
        let i_new = v_new / self.companion_resistance(dt) + self.history_current(dt);
        if !v_new.is_finite() || !i_new.is_finite() {
            log::warn!(
                "inductor {}: non-finite companion extraction (v={v_new}, i={i_new}), keeping previous state",
                self.id
            );
            return;
        }
        self.state.voltage = v_new;
        self.state.current = i_new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn capacitor_companion_conductance() {
        let c = Capacitor::new(ElementId(0), NodeId(1), NodeId(0), 1e-6).unwrap();
        let dt = 1.0 / 60.0;
        // G = 2C/dt = 2e-6 * 60
        assert_relative_eq!(c.companion_conductance(dt), 1.2e-4, max_relative = 1e-12);
        // Zero state, zero history current.
        assert_abs_diff_eq!(c.history_current(dt), 0.0);
    }

    #[test]
    fn capacitor_state_update_tracks_voltage() {
        let mut c = Capacitor::new(ElementId(0), NodeId(1), NodeId(0), 1e-6).unwrap();
        let dt = 1.0 / 60.0;
        c.update_state(1.0, dt);
        assert_relative_eq!(c.state.voltage, 1.0);
        // From rest, i = G * (1.0 - 0.0)
        assert_relative_eq!(c.state.current, c.companion_conductance(dt));
    }

    #[test]
    fn non_finite_extraction_keeps_previous_state() {
        let mut c = Capacitor::new(ElementId(0), NodeId(1), NodeId(0), 1e-6).unwrap();
        c.update_state(2.0, 1.0 / 60.0);
        let prev = c.state;
        c.update_state(f64::NAN, 1.0 / 60.0);
        assert_eq!(c.state, prev);
    }

    #[test]
    fn inductor_companion_resistance() {
        let l = Inductor::new(ElementId(0), NodeId(0), NodeId(1), 0.5).unwrap();
        let dt = 0.01;
        assert_relative_eq!(l.companion_resistance(dt), 100.0);
    }

    #[test]
    fn inductor_history_current_carries_state() {
        let l = Inductor::new(ElementId(0), NodeId(0), NodeId(1), 0.5)
            .unwrap()
            .with_initial_current(2.0);
        assert_relative_eq!(l.history_current(0.01), 2.0);
    }
}
