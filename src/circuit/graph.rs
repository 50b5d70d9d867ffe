//! Circuit topology snapshot.

use std::collections::HashMap;

use crate::elements::{Battery, CurrentSource, Resistor};

use super::types::NodeId;

/// An immutable snapshot of the circuit topology, captured once per tick.
///
/// External node ids are interned into dense indices in first-encountered
/// order (batteries, then resistors, then current sources; `node0` before
/// `node1`), with a side table back to the stable ids. The dense indices are
/// local to this snapshot and double as matrix columns during the solve.
#[derive(Debug)]
pub struct CircuitTopology {
    batteries: Vec<Battery>,
    resistors: Vec<Resistor>,
    current_sources: Vec<CurrentSource>,
    /// External id -> dense index.
    node_index: HashMap<NodeId, usize>,
    /// Dense index -> external id.
    node_ids: Vec<NodeId>,
    /// Dense index -> adjacent dense indices, in insertion order.
    adjacency: Vec<Vec<usize>>,
}

impl CircuitTopology {
    /// Build a topology snapshot from element lists.
    pub fn new(
        batteries: Vec<Battery>,
        resistors: Vec<Resistor>,
        current_sources: Vec<CurrentSource>,
    ) -> Self {
        let mut topology = Self {
            batteries,
            resistors,
            current_sources,
            node_index: HashMap::new(),
            node_ids: Vec::new(),
            adjacency: Vec::new(),
        };

        let terminals: Vec<(NodeId, NodeId)> = topology
            .batteries
            .iter()
            .map(|b| (b.node0, b.node1))
            .chain(topology.resistors.iter().map(|r| (r.node0, r.node1)))
            .chain(topology.current_sources.iter().map(|c| (c.node0, c.node1)))
            .collect();

        for (node0, node1) in terminals {
            let i = topology.intern(node0);
            let j = topology.intern(node1);
            topology.adjacency[i].push(j);
            topology.adjacency[j].push(i);
        }

        topology
    }

    fn intern(&mut self, node: NodeId) -> usize {
        if let Some(&index) = self.node_index.get(&node) {
            return index;
        }
        let index = self.node_ids.len();
        self.node_index.insert(node, index);
        self.node_ids.push(node);
        self.adjacency.push(Vec::new());
        index
    }

    /// Number of distinct nodes in the snapshot.
    pub fn num_nodes(&self) -> usize {
        self.node_ids.len()
    }

    /// Dense index for an external node id, if the node appears in the
    /// snapshot.
    pub fn node_dense_index(&self, node: NodeId) -> Option<usize> {
        self.node_index.get(&node).copied()
    }

    /// Dense index for a terminal of one of this snapshot's own elements.
    /// Every such terminal was interned by the constructor, so the lookup
    /// cannot miss; panics if handed a foreign node id.
    pub(crate) fn dense(&self, node: NodeId) -> usize {
        self.node_index[&node]
    }

    /// External id for a dense node index.
    pub fn node_id(&self, index: usize) -> NodeId {
        self.node_ids[index]
    }

    /// All external node ids, in dense-index order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn batteries(&self) -> &[Battery] {
        &self.batteries
    }

    pub fn resistors(&self) -> &[Resistor] {
        &self.resistors
    }

    pub fn current_sources(&self) -> &[CurrentSource] {
        &self.current_sources
    }

    /// One reference node per connected component: the first-encountered
    /// (lowest dense index) unvisited node seeds an iterative traversal, and
    /// that seed becomes the component's 0 V reference. Deterministic, and
    /// not semantically meaningful.
    pub fn reference_nodes(&self) -> Vec<usize> {
        let mut references = Vec::new();
        let mut visited = vec![false; self.num_nodes()];
        let mut stack = Vec::new();

        for seed in 0..self.num_nodes() {
            if visited[seed] {
                continue;
            }
            references.push(seed);
            visited[seed] = true;
            stack.push(seed);
            while let Some(node) = stack.pop() {
                for &neighbor in &self.adjacency[node] {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }

        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::ElementId;

    fn battery(id: usize, n0: usize, n1: usize, v: f64) -> Battery {
        Battery::new(ElementId(id), NodeId(n0), NodeId(n1), v).unwrap()
    }

    fn resistor(id: usize, n0: usize, n1: usize, r: f64) -> Resistor {
        Resistor::new(ElementId(id), NodeId(n0), NodeId(n1), r).unwrap()
    }

    #[test]
    fn node_interning_is_first_encountered_order() {
        let topology = CircuitTopology::new(
            vec![battery(0, 5, 9, 4.0)],
            vec![resistor(1, 9, 5, 2.0)],
            vec![],
        );
        assert_eq!(topology.num_nodes(), 2);
        assert_eq!(topology.node_dense_index(NodeId(5)), Some(0));
        assert_eq!(topology.node_dense_index(NodeId(9)), Some(1));
        assert_eq!(topology.node_id(1), NodeId(9));
        assert_eq!(topology.node_dense_index(NodeId(7)), None);
    }

    #[test]
    fn single_loop_has_one_reference() {
        let topology = CircuitTopology::new(
            vec![battery(0, 0, 1, 4.0)],
            vec![resistor(1, 1, 0, 2.0)],
            vec![],
        );
        assert_eq!(topology.reference_nodes(), vec![0]);
    }

    #[test]
    fn disconnected_subgraphs_get_one_reference_each() {
        let topology = CircuitTopology::new(
            vec![battery(0, 0, 1, 4.0), battery(2, 10, 11, 2.0)],
            vec![resistor(1, 1, 0, 2.0), resistor(3, 11, 10, 1.0)],
            vec![],
        );
        // Dense order: 0,1 from the first loop, 2,3 from the second.
        assert_eq!(topology.reference_nodes(), vec![0, 2]);
    }
}
