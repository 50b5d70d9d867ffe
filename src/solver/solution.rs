//! Immutable solve result.

use std::collections::HashMap;

use crate::circuit::{ElementId, NodeId};
use crate::elements::{Element, Resistor};

/// Absolute tolerance for the approximate-equality comparator, the primary
/// test oracle for solved voltages and currents.
pub const APPROX_EQUALS_TOLERANCE: f64 = 1e-4;

/// A solved branch current with the identity needed to match it against
/// another solution: the owning element and its terminal pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCurrent {
    pub element: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
    pub current: f64,
}

/// Read-only result of one solve: node voltages plus the explicitly solved
/// branch currents (batteries and zero-resistance resistors). Currents for
/// nonzero resistors are derived on demand from Ohm's law.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    node_voltages: HashMap<NodeId, f64>,
    branch_currents: Vec<BranchCurrent>,
}

impl Solution {
    pub fn new(node_voltages: HashMap<NodeId, f64>, branch_currents: Vec<BranchCurrent>) -> Self {
        Self {
            node_voltages,
            branch_currents,
        }
    }

    /// Voltage of a node, if it appears in the solved topology.
    pub fn voltage(&self, node: NodeId) -> Option<f64> {
        self.node_voltages.get(&node).copied()
    }

    /// `V(node0) - V(node1)`, if both nodes were solved.
    pub fn voltage_difference(&self, node0: NodeId, node1: NodeId) -> Option<f64> {
        Some(self.voltage(node0)? - self.voltage(node1)?)
    }

    /// All solved node voltages.
    pub fn node_voltages(&self) -> &HashMap<NodeId, f64> {
        &self.node_voltages
    }

    /// The explicitly solved branch currents, in branch order.
    pub fn branch_currents(&self) -> &[BranchCurrent] {
        &self.branch_currents
    }

    /// Directly solved current for a battery or zero-resistance resistor.
    pub fn solved_current(&self, element: ElementId) -> Option<f64> {
        self.branch_currents
            .iter()
            .find(|b| b.element == element)
            .map(|b| b.current)
    }

    /// Current through a resistor. For nonzero resistance this is derived as
    /// `-(V(node1) - V(node0)) / resistance`; a zero-resistance resistor has
    /// an explicitly solved current instead.
    pub fn current_for_resistor(&self, resistor: &Resistor) -> Option<f64> {
        if resistor.is_zero_resistance() {
            return self.solved_current(resistor.id);
        }
        let dv = self.voltage(resistor.node1)? - self.voltage(resistor.node0)?;
        Some(-dv / resistor.resistance)
    }

    /// One scalar signed current for any element, the contract the charge
    /// transport engine consumes.
    pub fn element_current(&self, element: &Element) -> Option<f64> {
        match element {
            Element::Battery(b) => self.solved_current(b.id),
            Element::Resistor(r) => self.current_for_resistor(r),
            Element::CurrentSource(c) => Some(c.current),
        }
    }

    /// Approximate equality: identical node-key sets with voltages within
    /// [`APPROX_EQUALS_TOLERANCE`], and branch currents matched one-to-one by
    /// terminal-pair identity with currents within the same tolerance.
    pub fn approx_equals(&self, other: &Solution) -> bool {
        if self.node_voltages.len() != other.node_voltages.len() {
            return false;
        }
        for (node, voltage) in &self.node_voltages {
            match other.voltage(*node) {
                Some(v) if (v - voltage).abs() <= APPROX_EQUALS_TOLERANCE => {}
                _ => return false,
            }
        }

        if self.branch_currents.len() != other.branch_currents.len() {
            return false;
        }
        let mut consumed = vec![false; other.branch_currents.len()];
        for branch in &self.branch_currents {
            let matched = other.branch_currents.iter().enumerate().position(|(i, b)| {
                !consumed[i]
                    && b.node0 == branch.node0
                    && b.node1 == branch.node1
                    && (b.current - branch.current).abs() <= APPROX_EQUALS_TOLERANCE
            });
            match matched {
                Some(i) => consumed[i] = true,
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn voltages(pairs: &[(usize, f64)]) -> HashMap<NodeId, f64> {
        pairs.iter().map(|&(n, v)| (NodeId(n), v)).collect()
    }

    fn branch(element: usize, n0: usize, n1: usize, current: f64) -> BranchCurrent {
        BranchCurrent {
            element: ElementId(element),
            node0: NodeId(n0),
            node1: NodeId(n1),
            current,
        }
    }

    #[test]
    fn resistor_current_is_derived_from_ohms_law() {
        let solution = Solution::new(voltages(&[(0, 0.0), (1, -4.0)]), vec![]);
        let r = Resistor::new(ElementId(1), NodeId(1), NodeId(0), 2.0).unwrap();
        // -(V(0) - V(1)) / 2 = -(0 - (-4)) / 2
        assert_relative_eq!(solution.current_for_resistor(&r).unwrap(), -2.0);
    }

    #[test]
    fn approx_equals_requires_same_node_sets() {
        let a = Solution::new(voltages(&[(0, 0.0), (1, 1.0)]), vec![]);
        let b = Solution::new(voltages(&[(0, 0.0), (2, 1.0)]), vec![]);
        assert!(!a.approx_equals(&b));
    }

    #[test]
    fn approx_equals_tolerates_small_differences() {
        let a = Solution::new(
            voltages(&[(0, 0.0), (1, 1.0)]),
            vec![branch(0, 0, 1, 2.0)],
        );
        let b = Solution::new(
            voltages(&[(0, 0.00005), (1, 1.0)]),
            vec![branch(7, 0, 1, 2.00005)],
        );
        // Different element ids, same terminal pair: still a match.
        assert!(a.approx_equals(&b));
    }

    #[test]
    fn approx_equals_rejects_current_mismatch() {
        let a = Solution::new(voltages(&[(0, 0.0)]), vec![branch(0, 0, 1, 2.0)]);
        let b = Solution::new(voltages(&[(0, 0.0)]), vec![branch(0, 0, 1, 2.1)]);
        assert!(!a.approx_equals(&b));
    }
}
