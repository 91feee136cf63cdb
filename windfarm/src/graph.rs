//! The residual wind farm graph.
//!
//! Built once from an [Instance] and then mutated only through its flow
//! values and residual costs. The edge table keeps four consecutive index
//! ranges (original, reverse, drain, reverse drain) so that
//! [Windfarm::reverse_edge] is pure index arithmetic and flow only has to be
//! stored once per undirected connection.

use crate::cables::Cabletypes;
use crate::instance::Instance;
use crate::{Cost, EdgeId, FlowUnits, VertexId};
use petgraph::visit::EdgeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    Turbine,
    Substation,
    SuperSubstation,
}

#[derive(Debug, Clone)]
struct Vertex {
    kind: VertexKind,
    x: f64,
    y: f64,
    capacity: i32,
    outgoing: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    start: VertexId,
    end: VertexId,
    length: f64,
    capacity: i32,
}

/// The wind farm residual graph.
///
/// Flow values are stored for original edges and drain edges only; the flow
/// on a reverse edge is the negation of its partner's flow, maintained
/// implicitly by the index arithmetic in [Windfarm::flow] and
/// [Windfarm::set_flow].
#[derive(Debug, Clone)]
pub struct Windfarm {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    turbines: Vec<VertexId>,
    substations: Vec<VertexId>,
    num_original_edges: usize,
    /// One entry per original edge followed by one entry per drain edge.
    flow: Vec<FlowUnits>,
    /// One entry per edge, rewritten before every detection run.
    residual_costs: Vec<Cost>,
    cables: Cabletypes,
}

impl Windfarm {
    pub fn new(instance: &Instance) -> Windfarm {
        let num_original_vertices = instance.num_nodes();
        let num_original_edges = instance.num_edges();
        let max_capacity = instance.cables().max_capacity();

        let mut vertices: Vec<Vertex> = (0..num_original_vertices)
            .map(|id| {
                let node = instance.node(id);
                Vertex {
                    kind: if instance.is_turbine(id) {
                        VertexKind::Turbine
                    } else {
                        VertexKind::Substation
                    },
                    x: node.x,
                    y: node.y,
                    capacity: node.capacity,
                    outgoing: Vec::new(),
                }
            })
            .collect();
        vertices.push(Vertex {
            kind: VertexKind::SuperSubstation,
            x: 0.0,
            y: 0.0,
            capacity: 0,
            outgoing: Vec::new(),
        });
        let super_substation = vertices.len() - 1;

        let turbines: Vec<VertexId> =
            (0..num_original_vertices).filter(|&v| instance.is_turbine(v)).collect();
        let substations: Vec<VertexId> =
            (0..num_original_vertices).filter(|&v| instance.is_substation(v)).collect();

        let mut edges =
            vec![
                Edge { start: 0, end: 0, length: 0.0, capacity: 0 };
                2 * num_original_edges + 2 * substations.len()
            ];

        for edge_ref in instance.graph().edge_references() {
            let id = edge_ref.id().index();
            let start = edge_ref.source().index();
            let end = edge_ref.target().index();
            let length = euclidean_length(instance, start, end);

            edges[id] = Edge { start, end, length, capacity: max_capacity };
            vertices[start].outgoing.push(id);

            let reverse_id = id + num_original_edges;
            edges[reverse_id] = Edge { start: end, end: start, length, capacity: max_capacity };
            vertices[end].outgoing.push(reverse_id);
        }

        for (i, &substation) in substations.iter().enumerate() {
            let capacity = vertices[substation].capacity;

            let drain_id = 2 * num_original_edges + i;
            edges[drain_id] =
                Edge { start: substation, end: super_substation, length: 0.0, capacity };
            vertices[substation].outgoing.push(drain_id);

            let from_super_id = drain_id + substations.len();
            edges[from_super_id] =
                Edge { start: super_substation, end: substation, length: 0.0, capacity };
            vertices[super_substation].outgoing.push(from_super_id);
        }

        let flow = vec![0; num_original_edges + substations.len()];
        let residual_costs = vec![0.0; edges.len()];

        Windfarm {
            vertices,
            edges,
            turbines,
            substations,
            num_original_edges,
            flow,
            residual_costs,
            cables: instance.cables().clone(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_turbines(&self) -> usize {
        self.turbines.len()
    }

    pub fn num_substations(&self) -> usize {
        self.substations.len()
    }

    pub fn num_original_edges(&self) -> usize {
        self.num_original_edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn super_substation(&self) -> VertexId {
        debug_assert!(matches!(
            self.vertices[self.vertices.len() - 1].kind,
            VertexKind::SuperSubstation
        ));
        self.vertices.len() - 1
    }

    pub fn turbines(&self) -> &[VertexId] {
        &self.turbines
    }

    pub fn substations(&self) -> &[VertexId] {
        &self.substations
    }

    pub fn outgoing_edges(&self, vertex: VertexId) -> &[EdgeId] {
        &self.vertices[vertex].outgoing
    }

    pub fn x(&self, vertex: VertexId) -> f64 {
        self.vertices[vertex].x
    }

    pub fn y(&self, vertex: VertexId) -> f64 {
        self.vertices[vertex].y
    }

    pub fn vertex_capacity(&self, vertex: VertexId) -> i32 {
        self.vertices[vertex].capacity
    }

    pub fn is_turbine(&self, vertex: VertexId) -> bool {
        self.vertices[vertex].kind == VertexKind::Turbine
    }

    pub fn is_substation(&self, vertex: VertexId) -> bool {
        self.vertices[vertex].kind == VertexKind::Substation
    }

    pub fn is_super_substation(&self, vertex: VertexId) -> bool {
        self.vertices[vertex].kind == VertexKind::SuperSubstation
    }

    pub fn start_vertex(&self, edge: EdgeId) -> VertexId {
        self.edges[edge].start
    }

    pub fn end_vertex(&self, edge: EdgeId) -> VertexId {
        self.edges[edge].end
    }

    pub fn length(&self, edge: EdgeId) -> f64 {
        self.edges[edge].length
    }

    pub fn edge_capacity(&self, edge: EdgeId) -> i32 {
        self.edges[edge].capacity
    }

    /// The partner edge with swapped endpoints. An involution.
    pub fn reverse_edge(&self, edge: EdgeId) -> EdgeId {
        debug_assert!(edge < self.num_edges());
        let m = self.num_original_edges;
        let s = self.substations.len();
        if edge < m {
            edge + m
        } else if edge < 2 * m {
            edge - m
        } else if edge < 2 * m + s {
            edge + s
        } else {
            edge - s
        }
    }

    /// Signed flow on the edge; positive in the direction of the edge.
    pub fn flow(&self, edge: EdgeId) -> FlowUnits {
        debug_assert!(edge < self.num_edges());
        let m = self.num_original_edges;
        let s = self.substations.len();
        if edge < m {
            self.flow[edge]
        } else if edge < 2 * m {
            -self.flow[edge - m]
        } else if edge < 2 * m + s {
            self.flow[edge - m]
        } else {
            -self.flow[edge - m - s]
        }
    }

    /// Overwrites the flow, keeping `flow(reverse(e)) == -flow(e)` by
    /// writing through to the shared storage slot.
    pub fn set_flow(&mut self, edge: EdgeId, new_flow: FlowUnits) {
        debug_assert!(edge < self.num_edges());
        let m = self.num_original_edges;
        let s = self.substations.len();
        if edge < m {
            self.flow[edge] = new_flow;
        } else if edge < 2 * m {
            self.flow[edge - m] = -new_flow;
        } else if edge < 2 * m + s {
            self.flow[edge - m] = new_flow;
        } else {
            self.flow[edge - m - s] = -new_flow;
        }
    }

    pub fn add_flow(&mut self, edge: EdgeId, delta: FlowUnits) {
        self.set_flow(edge, self.flow(edge) + delta);
    }

    pub fn add_flow_on_walk(&mut self, walk: &[EdgeId], delta: FlowUnits) {
        for &edge in walk {
            self.add_flow(edge, delta);
        }
    }

    pub fn min_flow_on_edges(&self, edges: &[EdgeId]) -> FlowUnits {
        edges.iter().map(|&e| self.flow(e)).min().unwrap_or(FlowUnits::MAX)
    }

    pub fn residual_cost(&self, edge: EdgeId) -> Cost {
        self.residual_costs[edge]
    }

    pub fn set_residual_cost(&mut self, edge: EdgeId, cost: Cost) {
        self.residual_costs[edge] = cost;
    }

    /// The edge from the given substation to the super substation. By
    /// construction it is the last outgoing edge of every substation.
    pub fn edge_to_super(&self, substation: VertexId) -> EdgeId {
        debug_assert!(self.is_substation(substation));
        let edge = *self.vertices[substation]
            .outgoing
            .last()
            .expect("substations always have a drain edge");
        debug_assert!(self.is_super_substation(self.end_vertex(edge)));
        edge
    }

    pub fn flow_to_substation(&self, substation: VertexId) -> FlowUnits {
        self.flow(self.edge_to_super(substation))
    }

    pub fn free_substation_capacity(&self, substation: VertexId) -> i32 {
        self.vertex_capacity(substation) - self.flow_to_substation(substation)
    }

    pub fn has_free_substation_capacity(&self, substation: VertexId) -> bool {
        self.free_substation_capacity(substation) > 0
    }

    /// Free capacity of an edge not incident to the super substation.
    pub fn free_edge_capacity(&self, edge: EdgeId) -> i32 {
        self.cables.max_capacity() - self.flow(edge)
    }

    pub fn has_free_edge_capacity(&self, edge: EdgeId) -> bool {
        self.free_edge_capacity(edge) > 0
    }

    /// Cable cost of the current flow on one edge.
    pub fn cost_of_flow_on_edge(&self, edge: EdgeId) -> Cost {
        self.cables.cost_of_flow(self.flow(edge)) as Cost * self.length(edge)
    }

    /// Total cable cost of the layout, summed over original edges only.
    pub fn total_cost(&self) -> Cost {
        (0..self.num_original_edges).map(|e| self.cost_of_flow_on_edge(e)).sum()
    }

    pub fn cables(&self) -> &Cabletypes {
        &self.cables
    }
}

fn euclidean_length(instance: &Instance, a: VertexId, b: VertexId) -> f64 {
    let na = instance.node(a);
    let nb = instance.node(b);
    ((na.x - nb.x).powi(2) + (na.y - nb.y).powi(2)).sqrt()
}

/// Panics unless every edge carries zero flow.
pub fn assert_zero_flow(farm: &Windfarm) {
    for edge in 0..farm.num_edges() {
        assert_eq!(farm.flow(edge), 0, "edge {} carries flow", edge);
    }
}

/// Panics unless the flow is feasible: reverse-edge symmetry, cable and
/// substation capacities, and conservation at every turbine and substation.
pub fn assert_feasible_flow(farm: &Windfarm) {
    for edge in 0..farm.num_edges() {
        assert_eq!(farm.flow(edge), -farm.flow(farm.reverse_edge(edge)));
        if !farm.is_super_substation(farm.start_vertex(edge))
            && !farm.is_super_substation(farm.end_vertex(edge))
        {
            assert!(farm.flow(edge) <= farm.cables().max_capacity());
        }
    }

    for &turbine in farm.turbines() {
        let sum: FlowUnits = farm.outgoing_edges(turbine).iter().map(|&e| farm.flow(e)).sum();
        assert_eq!(sum, 1, "turbine {} does not route exactly one unit", turbine);
    }

    for &substation in farm.substations() {
        let mut sum = 0;
        for &edge in farm.outgoing_edges(substation) {
            sum += farm.flow(edge);
            let end = farm.end_vertex(edge);
            if farm.is_turbine(end) {
                assert!(farm.flow(edge) <= 0);
            } else if farm.is_super_substation(end) {
                assert!(farm.flow(edge) >= 0);
            } else {
                assert_eq!(farm.flow(edge), 0);
            }
        }
        assert_eq!(sum, 0, "substation {} does not conserve flow", substation);
        assert!(farm.flow_to_substation(substation) >= 0);
        assert!(farm.flow_to_substation(substation) <= farm.vertex_capacity(substation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two turbines, one substation, three edges: 0-2, 1-2, 0-1.
    fn triangle_farm() -> Windfarm {
        let mut instance = Instance::with_default_cables(0, 1);
        let t0 = instance.add_turbine(0.0, 0.0);
        let t1 = instance.add_turbine(1.0, 0.0);
        let s = instance.add_substation(10.0, 0.0, 5);
        instance.add_edge(t0, s);
        instance.add_edge(t1, s);
        instance.add_edge(t0, t1);
        Windfarm::new(&instance)
    }

    #[test]
    fn edge_ranges_and_reverse() {
        let farm = triangle_farm();
        assert_eq!(farm.num_vertices(), 4);
        assert_eq!(farm.num_original_edges(), 3);
        // 2m + 2s edges
        assert_eq!(farm.num_edges(), 8);
        assert_eq!(farm.super_substation(), 3);

        for edge in 0..farm.num_edges() {
            assert_eq!(farm.reverse_edge(farm.reverse_edge(edge)), edge);
            assert_eq!(farm.start_vertex(edge), farm.end_vertex(farm.reverse_edge(edge)));
        }
        // drain edge of the single substation
        assert_eq!(farm.edge_to_super(2), 6);
        assert_eq!(farm.reverse_edge(6), 7);
    }

    #[test]
    fn flow_is_shared_with_reverse() {
        let mut farm = triangle_farm();
        farm.set_flow(0, 3);
        assert_eq!(farm.flow(0), 3);
        assert_eq!(farm.flow(farm.reverse_edge(0)), -3);

        farm.add_flow(farm.reverse_edge(0), 1);
        assert_eq!(farm.flow(0), 2);

        let drain = farm.edge_to_super(2);
        farm.set_flow(drain, 2);
        assert_eq!(farm.flow_to_substation(2), 2);
        assert_eq!(farm.flow(farm.reverse_edge(drain)), -2);
        assert_eq!(farm.free_substation_capacity(2), 3);
    }

    #[test]
    fn total_cost_counts_original_edges_only() {
        let mut farm = triangle_farm();
        farm.set_flow(0, 1);
        farm.set_flow(1, 1);
        let drain = farm.edge_to_super(2);
        farm.set_flow(drain, 2);
        // edge 0 has length 10, edge 1 has length 9, flow 1 each
        let expected = 20.0 * farm.length(0) + 20.0 * farm.length(1);
        assert!((farm.total_cost() - expected).abs() < 1e-9);
        assert_feasible_flow(&farm);
    }

    #[test]
    fn zero_flow_is_infeasible_for_turbines() {
        let farm = triangle_farm();
        assert_zero_flow(&farm);
        let result = std::panic::catch_unwind(|| assert_feasible_flow(&farm));
        assert!(result.is_err());
    }

    #[test]
    fn walk_helpers() {
        let mut farm = triangle_farm();
        farm.add_flow_on_walk(&[2, 1], 1);
        assert_eq!(farm.flow(2), 1);
        assert_eq!(farm.flow(1), 1);
        assert_eq!(farm.min_flow_on_edges(&[2, 1, 0]), 0);
    }
}
