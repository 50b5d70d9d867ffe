//! Equation builder: topology snapshot -> ordered sparse linear equations.
//!
//! Unknowns are one voltage per distinct node plus one current per battery
//! and per zero-resistance resistor. Equations are emitted in a fixed order:
//! one reference row per connected component, one KCL row per node, then the
//! battery and zero-resistance constraint rows. The system has one redundant
//! KCL row per connected component; the linear solver absorbs that via a
//! least-squares QR solve.
//!
//! Sign convention (held consistently through the resistor current
//! derivation and the transport engine): a KCL row reads
//! `sum(+-I_branch) - sum(G * (V(n) - V(m))) = rhs`, with `+I` when the node
//! is the element's `node0`; a current source adds `+current` to the RHS at
//! its `node0` and `-current` at its `node1`; a battery row reads
//! `V(node0) - V(node1) = voltage`.

use crate::circuit::{BranchIndex, CircuitTopology, ElementId, NodeId, Unknown};

/// One `(coefficient, unknown)` pair of a sparse equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub coefficient: f64,
    pub unknown: Unknown,
}

impl Term {
    pub fn new(coefficient: f64, unknown: Unknown) -> Self {
        Self {
            coefficient,
            unknown,
        }
    }
}

/// A single linear equation: a sparse sum of terms equal to a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub terms: Vec<Term>,
    pub rhs: f64,
}

impl Equation {
    pub fn new(terms: Vec<Term>, rhs: f64) -> Self {
        Self { terms, rhs }
    }
}

/// Identity of a branch-current unknown: which element it belongs to and
/// that element's terminals, for splitting the solved vector back out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchRef {
    pub element: ElementId,
    pub node0: NodeId,
    pub node1: NodeId,
}

/// The assembled sparse system for one solve.
#[derive(Debug)]
pub struct EquationSystem {
    pub equations: Vec<Equation>,
    /// Number of node-voltage unknowns (dense node indices `0..num_nodes`).
    pub num_nodes: usize,
    /// Branch-current unknowns in index order: batteries first, then
    /// zero-resistance resistors.
    pub branches: Vec<BranchRef>,
}

impl EquationSystem {
    pub fn num_unknowns(&self) -> usize {
        self.num_nodes + self.branches.len()
    }
}

/// Build the MNA equation system for a topology snapshot.
pub fn build_equations(topology: &CircuitTopology) -> EquationSystem {
    let num_nodes = topology.num_nodes();

    // Branch indices: batteries in list order, then zero-resistance resistors.
    let mut branches = Vec::new();
    let battery_branches: Vec<BranchIndex> = topology
        .batteries()
        .iter()
        .map(|b| {
            branches.push(BranchRef {
                element: b.id,
                node0: b.node0,
                node1: b.node1,
            });
            BranchIndex(branches.len() - 1)
        })
        .collect();
    let zero_resistor_branches: Vec<(usize, BranchIndex)> = topology
        .resistors()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_zero_resistance())
        .map(|(i, r)| {
            branches.push(BranchRef {
                element: r.id,
                node0: r.node0,
                node1: r.node1,
            });
            (i, BranchIndex(branches.len() - 1))
        })
        .collect();

    let mut equations = Vec::new();

    // One reference row per connected component: V(reference) = 0.
    for reference in topology.reference_nodes() {
        equations.push(Equation::new(
            vec![Term::new(1.0, Unknown::Voltage(reference))],
            0.0,
        ));
    }

    // One KCL row per node.
    let mut kcl: Vec<Equation> = (0..num_nodes)
        .map(|_| Equation::new(Vec::new(), 0.0))
        .collect();

    for (battery, &branch) in topology.batteries().iter().zip(&battery_branches) {
        let n0 = topology.dense(battery.node0);
        let n1 = topology.dense(battery.node1);
        kcl[n0].terms.push(Term::new(1.0, Unknown::Current(branch)));
        kcl[n1].terms.push(Term::new(-1.0, Unknown::Current(branch)));
    }

    for &(resistor_index, branch) in &zero_resistor_branches {
        let resistor = &topology.resistors()[resistor_index];
        let n0 = topology.dense(resistor.node0);
        let n1 = topology.dense(resistor.node1);
        kcl[n0].terms.push(Term::new(1.0, Unknown::Current(branch)));
        kcl[n1].terms.push(Term::new(-1.0, Unknown::Current(branch)));
    }

    for resistor in topology.resistors().iter().filter(|r| !r.is_zero_resistance()) {
        let n0 = topology.dense(resistor.node0);
        let n1 = topology.dense(resistor.node1);
        let g = resistor.conductance();
        // Current leaving each terminal node: -G*(V(n) - V(m)) on the LHS.
        kcl[n0].terms.push(Term::new(-g, Unknown::Voltage(n0)));
        kcl[n0].terms.push(Term::new(g, Unknown::Voltage(n1)));
        kcl[n1].terms.push(Term::new(-g, Unknown::Voltage(n1)));
        kcl[n1].terms.push(Term::new(g, Unknown::Voltage(n0)));
    }

    for source in topology.current_sources() {
        let n0 = topology.dense(source.node0);
        let n1 = topology.dense(source.node1);
        kcl[n0].rhs += source.current;
        kcl[n1].rhs -= source.current;
    }

    equations.extend(kcl);

    // Battery constraint rows: V(node0) - V(node1) = voltage.
    for battery in topology.batteries() {
        let n0 = topology.dense(battery.node0);
        let n1 = topology.dense(battery.node1);
        equations.push(Equation::new(
            vec![
                Term::new(1.0, Unknown::Voltage(n0)),
                Term::new(-1.0, Unknown::Voltage(n1)),
            ],
            battery.voltage,
        ));
    }

    // Zero-resistance constraint rows: V(node0) = V(node1).
    for &(resistor_index, _) in &zero_resistor_branches {
        let resistor = &topology.resistors()[resistor_index];
        let n0 = topology.dense(resistor.node0);
        let n1 = topology.dense(resistor.node1);
        equations.push(Equation::new(
            vec![
                Term::new(1.0, Unknown::Voltage(n0)),
                Term::new(-1.0, Unknown::Voltage(n1)),
            ],
            0.0,
        ));
    }

    EquationSystem {
        equations,
        num_nodes,
        branches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Battery, Resistor};

    fn simple_loop() -> CircuitTopology {
        CircuitTopology::new(
            vec![Battery::new(ElementId(0), NodeId(0), NodeId(1), 4.0).unwrap()],
            vec![Resistor::new(ElementId(1), NodeId(1), NodeId(0), 2.0).unwrap()],
            vec![],
        )
    }

    #[test]
    fn unknown_count_is_nodes_plus_branches() {
        // #unknowns = #nodes + #batteries + #zero-resistance resistors
        let system = build_equations(&simple_loop());
        assert_eq!(system.num_nodes, 2);
        assert_eq!(system.branches.len(), 1);
        assert_eq!(system.num_unknowns(), 3);
    }

    #[test]
    fn equation_count_and_order() {
        // 1 reference + 2 KCL + 1 battery constraint.
        let system = build_equations(&simple_loop());
        assert_eq!(system.equations.len(), 4);

        // Reference row pins the first-encountered node.
        assert_eq!(
            system.equations[0].terms,
            vec![Term::new(1.0, Unknown::Voltage(0))]
        );
        assert_eq!(system.equations[0].rhs, 0.0);

        // Battery constraint row: V(0) - V(1) = 4.
        let battery_row = &system.equations[3];
        assert_eq!(battery_row.rhs, 4.0);
        assert_eq!(
            battery_row.terms,
            vec![
                Term::new(1.0, Unknown::Voltage(0)),
                Term::new(-1.0, Unknown::Voltage(1)),
            ]
        );
    }

    #[test]
    fn zero_resistance_resistor_gets_branch_and_constraint() {
        let topology = CircuitTopology::new(
            vec![Battery::new(ElementId(0), NodeId(0), NodeId(1), 4.0).unwrap()],
            vec![
                Resistor::new(ElementId(1), NodeId(1), NodeId(2), 0.0).unwrap(),
                Resistor::new(ElementId(2), NodeId(2), NodeId(0), 2.0).unwrap(),
            ],
            vec![],
        );
        let system = build_equations(&topology);
        // Battery branch then zero-resistance branch.
        assert_eq!(system.branches.len(), 2);
        assert_eq!(system.branches[1].element, ElementId(1));
        // 1 reference + 3 KCL + 1 battery + 1 zero-R constraint.
        assert_eq!(system.equations.len(), 6);
        let zero_row = system.equations.last().unwrap();
        assert_eq!(zero_row.rhs, 0.0);
        assert_eq!(zero_row.terms.len(), 2);
    }

    #[test]
    fn current_source_contributes_only_to_rhs() {
        let topology = CircuitTopology::new(
            vec![],
            vec![Resistor::new(ElementId(0), NodeId(1), NodeId(0), 1.0).unwrap()],
            vec![crate::elements::CurrentSource::new(ElementId(1), NodeId(0), NodeId(1), 2.0).unwrap()],
        );
        let system = build_equations(&topology);
        assert_eq!(system.branches.len(), 0);
        // Dense order: node 1 interned first (resistor listed first).
        let kcl_node1 = &system.equations[1];
        let kcl_node0 = &system.equations[2];
        assert_eq!(kcl_node1.rhs, -2.0);
        assert_eq!(kcl_node0.rhs, 2.0);
    }
}
