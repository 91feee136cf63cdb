//! The problem instance: input topology plus metadata.
//!
//! The topology lives in a petgraph [DiGraph] and is never mutated after
//! parsing. Vertices are turbines or substations; the super substation does
//! not exist at this level, it is added by [crate::graph::Windfarm].

use crate::cables::Cabletypes;
use crate::{EdgeId, VertexId};
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Turbine,
    Substation,
}

/// Node payload of the input topology.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    /// Substation capacity; zero for turbines.
    pub capacity: i32,
}

/// An immutable problem instance: the input graph, its cable catalogue and
/// the testset/instance numbers recovered from the input file name.
#[derive(Debug)]
pub struct Instance {
    graph: DiGraph<Node, ()>,
    testset: usize,
    instance: usize,
    cables: Cabletypes,
    num_turbines: usize,
    num_substations: usize,
    total_substation_capacity: i32,
}

impl Instance {
    pub fn new(testset: usize, instance: usize, cables: Cabletypes) -> Instance {
        Instance {
            graph: DiGraph::new(),
            testset,
            instance,
            cables,
            num_turbines: 0,
            num_substations: 0,
            total_substation_capacity: 0,
        }
    }

    /// An instance with the compiled-in default cable catalogue.
    pub fn with_default_cables(testset: usize, instance: usize) -> Instance {
        let cables = Cabletypes::from_breakpoints(vec![5, 8, 12, 15], vec![20, 25, 27, 41])
            .expect("default cable table is well formed");
        Instance::new(testset, instance, cables)
    }

    pub fn add_turbine(&mut self, x: f64, y: f64) -> VertexId {
        self.num_turbines += 1;
        self.graph
            .add_node(Node { kind: NodeKind::Turbine, x, y, capacity: 0 })
            .index()
    }

    pub fn add_substation(&mut self, x: f64, y: f64, capacity: i32) -> VertexId {
        self.num_substations += 1;
        self.total_substation_capacity += capacity;
        self.graph
            .add_node(Node { kind: NodeKind::Substation, x, y, capacity })
            .index()
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> EdgeId {
        self.graph
            .add_edge(NodeIndex::new(from), NodeIndex::new(to), ())
            .index()
    }

    pub fn graph(&self) -> &DiGraph<Node, ()> {
        &self.graph
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn num_turbines(&self) -> usize {
        self.num_turbines
    }

    pub fn num_substations(&self) -> usize {
        self.num_substations
    }

    pub fn node(&self, id: VertexId) -> &Node {
        &self.graph[NodeIndex::new(id)]
    }

    pub fn is_turbine(&self, id: VertexId) -> bool {
        self.node(id).kind == NodeKind::Turbine
    }

    pub fn is_substation(&self, id: VertexId) -> bool {
        self.node(id).kind == NodeKind::Substation
    }

    pub fn substation_capacity(&self, id: VertexId) -> i32 {
        debug_assert!(self.is_substation(id));
        self.node(id).capacity
    }

    pub fn total_substation_capacity(&self) -> i32 {
        self.total_substation_capacity
    }

    /// How tightly the substations bound the layout: total substation
    /// capacity divided by the number of turbines.
    pub fn capacity_tightness(&self) -> f64 {
        self.total_substation_capacity as f64 / self.num_turbines as f64
    }

    pub fn cables(&self) -> &Cabletypes {
        &self.cables
    }

    pub fn testset(&self) -> usize {
        self.testset
    }

    pub fn instance(&self) -> usize {
        self.instance
    }

    pub fn test_instance_string(&self) -> String {
        format!("t-{}-i-{}", self.testset, self.instance)
    }

    pub fn long_test_instance_string(&self) -> String {
        format!("testset-{}-instance-{}", self.testset, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_bookkeeping() {
        let mut instance = Instance::with_default_cables(3, 7);
        let t0 = instance.add_turbine(0.0, 0.0);
        let t1 = instance.add_turbine(1.0, 0.0);
        let s = instance.add_substation(2.0, 0.0, 5);
        instance.add_edge(t0, s);
        instance.add_edge(t1, s);

        assert_eq!(instance.num_nodes(), 3);
        assert_eq!(instance.num_edges(), 2);
        assert_eq!(instance.num_turbines(), 2);
        assert_eq!(instance.num_substations(), 1);
        assert!(instance.is_turbine(t0));
        assert!(instance.is_substation(s));
        assert_eq!(instance.substation_capacity(s), 5);
        assert_eq!(instance.total_substation_capacity(), 5);
        assert!((instance.capacity_tightness() - 2.5).abs() < 1e-9);
        assert_eq!(instance.test_instance_string(), "t-3-i-7");
        assert_eq!(instance.long_test_instance_string(), "testset-3-instance-7");
    }
}
