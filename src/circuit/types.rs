//! Core types for circuit representation.

use std::fmt;

/// A stable, opaque identifier for a node, assigned by the external editor.
///
/// Node ids carry no electrical meaning. Each solve interns the node ids it
/// actually encounters into dense indices (see
/// [`CircuitTopology`](super::CircuitTopology)); there is no distinguished
/// ground node; every connected component gets its own 0 V reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A stable identifier for an element, assigned by the external editor.
///
/// Used to key solved branch currents and charge-transport state across
/// topology edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Index of a branch-current unknown (batteries and zero-resistance
/// resistors), dense within a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchIndex(pub usize);

impl fmt::Display for BranchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

/// An unknown in the MNA solution vector: either a node voltage (by dense
/// node index) or a branch current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unknown {
    /// Voltage of the node with the given dense index.
    Voltage(usize),
    /// Current through the branch with the given index.
    Current(BranchIndex),
}

impl Unknown {
    /// Column of this unknown in the assembled matrix. Node voltages come
    /// first, branch currents after.
    pub fn column(&self, num_nodes: usize) -> usize {
        match self {
            Unknown::Voltage(n) => *n,
            Unknown::Current(BranchIndex(b)) => num_nodes + b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_column_layout() {
        assert_eq!(Unknown::Voltage(2).column(4), 2);
        assert_eq!(Unknown::Current(BranchIndex(0)).column(4), 4);
        assert_eq!(Unknown::Current(BranchIndex(3)).column(4), 7);
    }
}
