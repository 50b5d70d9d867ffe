//! The charge transport engine.
//!
//! Advances visual carriers along elements in proportion to the solved
//! currents, routes them across vertices when they overrun an element, and
//! runs a couple of density-equalization passes so the spacing looks even
//! without fighting the current-driven motion.
//!
//! Batch semantics: `step` computes every position before returning, and
//! positions are only observable through [`ChargeTransport::carriers`]
//! afterwards; there is no per-carrier visual refresh to suspend.

use std::collections::{BTreeMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::circuit::{ElementId, NodeId};
use crate::error::{GalvaniError, Result};

use super::carrier::{Carrier, TransportElement};

/// Nominal spacing between seeded carriers.
pub const CHARGE_SEPARATION: f64 = 0.5;

/// Largest allowed carrier displacement per step, as a fraction of the
/// nominal spacing. Displacements past a neighbor read as motion in the
/// wrong direction (a strobe artifact), so the whole tick is slowed down
/// instead.
const MAX_STEP_FRACTION: f64 = 0.43;
const MAX_CARRIER_STEP: f64 = CHARGE_SEPARATION * MAX_STEP_FRACTION;

/// Moving-average depth for the time-scale diagnostic.
const TIME_SCALE_WINDOW: usize = 30;

/// Below this |current|, carriers hold still; avoids jitter near zero.
pub const MINIMUM_CURRENT: f64 = 1e-10;

/// Tolerance when judging whether a neighbor's current continues outward
/// flow; ignores solver noise near zero.
const DIRECTION_TOLERANCE: f64 = 1e-8;

/// Equalization passes per step.
const EQUALIZE_PASSES: usize = 2;

/// Per-second equalization correction speed when the nudge agrees with the
/// local current direction, and when it opposes it.
const EQUALIZE_SPEED_ALIGNED: f64 = 5.0;
const EQUALIZE_SPEED_OPPOSED: f64 = 1.0;

/// Default conversion from amps to carrier speed (path units per second).
pub const DEFAULT_SPEED_SCALE: f64 = 0.25;

const DEFAULT_SEED: u64 = 0x9a1e_0c5d;

/// Maintains and animates the visual carriers for a set of elements.
///
/// The engine is fed the vertex adjacency implicitly through
/// [`add_element`](Self::add_element) terminals, and the per-element
/// currents through [`set_current`](Self::set_current) after every solve.
#[derive(Debug)]
pub struct ChargeTransport {
    elements: BTreeMap<ElementId, TransportElement>,
    /// Vertex -> incident elements, insertion order.
    vertex_elements: BTreeMap<NodeId, Vec<ElementId>>,
    carriers: Vec<Carrier>,
    /// Sign seeded onto new carriers; -1 shows electron flow.
    carrier_sign: f64,
    speed_scale: f64,
    time_scale_history: VecDeque<f64>,
    time_scale: f64,
    rng: StdRng,
}

impl Default for ChargeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ChargeTransport {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Create an engine with an explicit seed for the equalization-pass
    /// permutation, so runs are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            elements: BTreeMap::new(),
            vertex_elements: BTreeMap::new(),
            carriers: Vec::new(),
            carrier_sign: -1.0,
            speed_scale: DEFAULT_SPEED_SCALE,
            time_scale_history: VecDeque::with_capacity(TIME_SCALE_WINDOW),
            time_scale: 1.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Set the sign seeded onto new carriers (+1 conventional, -1 electron).
    pub fn set_carrier_sign(&mut self, sign: f64) {
        debug_assert!(sign == 1.0 || sign == -1.0);
        self.carrier_sign = sign;
    }

    /// Set the amps-to-speed conversion factor.
    pub fn set_speed_scale(&mut self, speed_scale: f64) {
        self.speed_scale = speed_scale;
    }

    /// Register an element and seed its carriers at nominal spacing.
    pub fn add_element(
        &mut self,
        id: ElementId,
        node0: NodeId,
        node1: NodeId,
        path_length: f64,
    ) -> Result<()> {
        if node0 == node1 {
            return Err(GalvaniError::invalid_element(
                "transport element",
                format!("terminals must be distinct, both are {node0}"),
            ));
        }
        if !path_length.is_finite() || path_length <= 0.0 {
            return Err(GalvaniError::invalid_element(
                "transport element",
                format!("path length must be finite and > 0, got {path_length}"),
            ));
        }
        self.elements.insert(
            id,
            TransportElement {
                id,
                node0,
                node1,
                path_length,
                current: 0.0,
                layout_dirty: false,
            },
        );
        self.vertex_elements.entry(node0).or_default().push(id);
        self.vertex_elements.entry(node1).or_default().push(id);
        self.seed_carriers(id);
        Ok(())
    }

    /// Remove an element and destroy its carriers.
    pub fn remove_element(&mut self, id: ElementId) {
        let Some(element) = self.elements.remove(&id) else {
            return;
        };
        for node in [element.node0, element.node1] {
            if let Some(incident) = self.vertex_elements.get_mut(&node) {
                incident.retain(|&e| e != id);
                if incident.is_empty() {
                    self.vertex_elements.remove(&node);
                }
            }
        }
        self.carriers.retain(|c| c.element != id);
    }

    /// Flag an element as pending relayout; its carriers hold still until
    /// [`relayout`](Self::relayout).
    pub fn mark_layout_dirty(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.layout_dirty = true;
        }
    }

    /// Re-seed an element's carriers after a topology edit and clear its
    /// dirty flag.
    pub fn relayout(&mut self, id: ElementId) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.layout_dirty = false;
            self.seed_carriers(id);
        }
    }

    /// Record the latest solved current for an element.
    pub fn set_current(&mut self, id: ElementId, current: f64) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.current = current;
        }
    }

    /// All carriers, positions as of the last completed step.
    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    /// Number of carriers currently on an element.
    pub fn carrier_count(&self, id: ElementId) -> usize {
        self.carriers.iter().filter(|c| c.element == id).count()
    }

    /// Smoothed clamp factor over recent ticks, in `(0, 1]`. Purely
    /// diagnostic; carrier motion is clamped by each tick's raw factor.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    fn seed_carriers(&mut self, id: ElementId) {
        self.carriers.retain(|c| c.element != id);
        let path_length = self.elements[&id].path_length;
        let mut distance = CHARGE_SEPARATION / 2.0;
        while distance < path_length {
            self.carriers.push(Carrier {
                element: id,
                distance,
                charge_sign: self.carrier_sign,
            });
            distance += CHARGE_SEPARATION;
        }
    }

    /// Advance all carriers by one tick.
    pub fn step(&mut self, dt: f64) {
        let step_scale = self.update_time_scale(dt);

        let mut counts: BTreeMap<ElementId, usize> = BTreeMap::new();
        for carrier in &self.carriers {
            *counts.entry(carrier.element).or_insert(0) += 1;
        }

        for i in 0..self.carriers.len() {
            self.propagate(i, dt, step_scale, &mut counts);
        }

        for _ in 0..EQUALIZE_PASSES {
            let mut order: Vec<usize> = (0..self.carriers.len()).collect();
            order.shuffle(&mut self.rng);
            for &i in &order {
                self.equalize(i, dt);
            }
        }
    }

    /// Derive this tick's clamp factor from the largest displacement any
    /// carrier could make, fold it into the diagnostic moving average, and
    /// return the raw factor. Motion must use the raw value: a smoothed
    /// factor lags behind a sudden current spike and lets a carrier jump
    /// past its neighbors.
    fn update_time_scale(&mut self, dt: f64) -> f64 {
        let max_current = self
            .elements
            .values()
            .map(|e| e.current.abs())
            .fold(0.0, f64::max);
        let max_displacement = max_current * self.speed_scale * dt;
        let raw = if max_displacement > MAX_CARRIER_STEP {
            MAX_CARRIER_STEP / max_displacement
        } else {
            1.0
        };
        self.time_scale_history.push_back(raw);
        while self.time_scale_history.len() > TIME_SCALE_WINDOW {
            self.time_scale_history.pop_front();
        }
        self.time_scale =
            self.time_scale_history.iter().sum::<f64>() / self.time_scale_history.len() as f64;
        raw
    }

    fn propagate(
        &mut self,
        index: usize,
        dt: f64,
        step_scale: f64,
        counts: &mut BTreeMap<ElementId, usize>,
    ) {
        let carrier = self.carriers[index];
        let Some(&element) = self.elements.get(&carrier.element) else {
            return;
        };
        if element.layout_dirty || element.current.abs() < MINIMUM_CURRENT {
            return;
        }

        let velocity = element.current * carrier.charge_sign * self.speed_scale * step_scale;
        let new_distance = carrier.distance + velocity * dt;
        if (0.0..=element.path_length).contains(&new_distance) {
            self.carriers[index].distance = new_distance;
            return;
        }

        // Overran an end: route across the vertex.
        let (exit_node, overshoot) = if new_distance > element.path_length {
            (element.node1, new_distance - element.path_length)
        } else {
            (element.node0, -new_distance)
        };

        let neighbors = match self.vertex_elements.get(&exit_node) {
            Some(incident) => incident.clone(),
            None => return,
        };

        // Among neighbors that continue the flow outward, lowest carrier
        // density wins, so transfers do not bunch up on one branch.
        let mut best: Option<(f64, ElementId, f64)> = None;
        for id in neighbors {
            if id == element.id {
                continue;
            }
            let neighbor = self.elements[&id];
            let outward = neighbor.current * carrier.charge_sign;
            let target = if neighbor.node0 == exit_node {
                if outward <= DIRECTION_TOLERANCE {
                    continue;
                }
                overshoot
            } else if neighbor.node1 == exit_node {
                if outward >= -DIRECTION_TOLERANCE {
                    continue;
                }
                neighbor.path_length - overshoot
            } else {
                continue;
            };
            let target = target.clamp(0.0, neighbor.path_length);
            let density =
                counts.get(&id).copied().unwrap_or(0) as f64 / neighbor.path_length;
            if best.map_or(true, |(d, _, _)| density < d) {
                best = Some((density, id, target));
            }
        }

        // No valid branch: hold position this step.
        let Some((_, destination, target)) = best else {
            return;
        };
        *counts.entry(element.id).or_insert(1) -= 1;
        *counts.entry(destination).or_insert(0) += 1;
        self.carriers[index].element = destination;
        self.carriers[index].distance = target;
    }

    /// Nudge a carrier toward the midpoint of its immediate same-element
    /// neighbors. Faster when the nudge rides the current, slower against
    /// it, always clamped so equalization cannot override real motion.
    /// Unlike propagation, this runs even on a dead element, so carriers
    /// bunched up by an earlier transfer still spread back out.
    fn equalize(&mut self, index: usize, dt: f64) {
        let carrier = self.carriers[index];
        let Some(&element) = self.elements.get(&carrier.element) else {
            return;
        };
        if element.layout_dirty {
            return;
        }

        let mut lower: Option<f64> = None;
        let mut upper: Option<f64> = None;
        for (j, other) in self.carriers.iter().enumerate() {
            if j == index || other.element != carrier.element {
                continue;
            }
            if other.distance < carrier.distance {
                lower = Some(lower.map_or(other.distance, |d: f64| d.max(other.distance)));
            } else if other.distance > carrier.distance {
                upper = Some(upper.map_or(other.distance, |d: f64| d.min(other.distance)));
            }
        }
        let (Some(lower), Some(upper)) = (lower, upper) else {
            return;
        };

        let delta = (lower + upper) / 2.0 - carrier.distance;
        if delta == 0.0 {
            return;
        }
        let flow = element.current * carrier.charge_sign;
        let aligned = flow != 0.0 && delta.signum() == flow.signum();
        let speed = if aligned {
            EQUALIZE_SPEED_ALIGNED
        } else {
            EQUALIZE_SPEED_OPPOSED
        };
        let limit = speed * dt;
        let nudge = delta.clamp(-limit, limit);
        self.carriers[index].distance =
            (carrier.distance + nudge).clamp(0.0, element.path_length);
    }

    #[cfg(test)]
    fn place_carrier(&mut self, index: usize, distance: f64) {
        self.carriers[index].distance = distance;
    }
}
