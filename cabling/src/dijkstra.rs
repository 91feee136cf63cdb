//! Shortest paths for the flow initialization.
//!
//! A plain binary-heap Dijkstra with lazy deletion: stale heap entries are
//! skipped when popped. Edges are only relaxed while they have free cable
//! capacity, and substations are settled without being expanded, so paths
//! never run through a substation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use windfarm::{EdgeId, Status, VertexId, Windfarm};

/// What a shortest-path run is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A concrete vertex.
    Vertex(VertexId),
    /// The closest substation with free capacity.
    AnyFreeSubstation,
    /// A substation with free capacity that is settled after every other
    /// substation; if the search exhausts the graph first, the most
    /// recently settled free substation wins.
    LastFreeSubstation,
}

/// Which length the search assigns to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMetric {
    /// Euclidean length from the vertex coordinates.
    Euclidean,
    /// Unit length, turning Dijkstra into a breadth-first search.
    Unit,
}

impl EdgeMetric {
    fn edge_length(self, farm: &Windfarm, edge: EdgeId) -> f64 {
        match self {
            EdgeMetric::Euclidean => farm.length(edge),
            EdgeMetric::Unit => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    distance: f64,
    vertex: VertexId,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed on distance so the max-heap pops the closest vertex.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

pub struct Dijkstra {
    metric: EdgeMetric,
    dist: Vec<f64>,
    // Only meaningful where dist is finite; not reset between runs.
    parent: Vec<Option<EdgeId>>,
    heap: BinaryHeap<Entry>,
    settled_substations: usize,
    last_free_substation_settled: Option<VertexId>,
    start: VertexId,
    resolved_target: Option<VertexId>,
}

impl Dijkstra {
    pub fn new(farm: &Windfarm, metric: EdgeMetric) -> Dijkstra {
        Dijkstra {
            metric,
            dist: vec![f64::INFINITY; farm.num_vertices()],
            parent: vec![None; farm.num_vertices()],
            heap: BinaryHeap::new(),
            settled_substations: 0,
            last_free_substation_settled: None,
            start: 0,
            resolved_target: None,
        }
    }

    /// Runs the search. On [Status::Success],
    /// [Dijkstra::resolved_target] names the substation (or vertex) that
    /// was reached and [Dijkstra::extract_walk] yields the path to it.
    pub fn run(&mut self, farm: &Windfarm, start: VertexId, target: Target) -> Status {
        self.reset();
        self.start = start;
        self.dist[start] = 0.0;
        self.heap.push(Entry { distance: 0.0, vertex: start });

        while let Some(current) = self.heap.pop() {
            if self.dist[current.vertex] < current.distance {
                // stale entry
                continue;
            }

            if self.is_target(farm, current.vertex, target) {
                self.resolved_target = Some(current.vertex);
                return Status::Success;
            }

            if farm.is_substation(current.vertex) {
                self.settled_substations += 1;
                if farm.has_free_substation_capacity(current.vertex) {
                    self.last_free_substation_settled = Some(current.vertex);
                }
                continue;
            }

            if current.distance == self.dist[current.vertex] {
                self.relax_all_neighbors(farm, current.vertex);
            }
        }

        if target == Target::LastFreeSubstation {
            if let Some(substation) = self.last_free_substation_settled {
                self.resolved_target = Some(substation);
                return Status::Success;
            }
        }

        Status::Infeasible
    }

    /// The vertex the last successful run resolved to.
    pub fn resolved_target(&self) -> Option<VertexId> {
        self.resolved_target
    }

    /// The edges from the start vertex to the resolved target, in walk
    /// order. Only valid after a successful run.
    pub fn extract_walk(&self, farm: &Windfarm) -> Vec<EdgeId> {
        let mut walk = Vec::new();
        let mut current = self.resolved_target.expect("extract_walk after a successful run");
        while current != self.start {
            let edge = self.parent[current].expect("parents reach back to the start vertex");
            walk.push(edge);
            current = farm.start_vertex(edge);
        }
        walk.reverse();
        walk
    }

    fn reset(&mut self) {
        self.dist.iter_mut().for_each(|d| *d = f64::INFINITY);
        self.heap.clear();
        self.settled_substations = 0;
        self.last_free_substation_settled = None;
        self.resolved_target = None;
    }

    fn is_target(&self, farm: &Windfarm, vertex: VertexId, target: Target) -> bool {
        match target {
            Target::Vertex(id) => vertex == id,
            Target::AnyFreeSubstation => {
                farm.is_substation(vertex) && farm.has_free_substation_capacity(vertex)
            }
            Target::LastFreeSubstation => {
                farm.is_substation(vertex)
                    && farm.has_free_substation_capacity(vertex)
                    && self.settled_substations == farm.num_substations() - 1
            }
        }
    }

    fn relax_all_neighbors(&mut self, farm: &Windfarm, vertex: VertexId) {
        for &edge in farm.outgoing_edges(vertex) {
            self.relax_edge(farm, edge);
        }
    }

    fn relax_edge(&mut self, farm: &Windfarm, edge: EdgeId) {
        if !farm.has_free_edge_capacity(edge) {
            return;
        }
        let current = farm.start_vertex(edge);
        let end = farm.end_vertex(edge);
        let distance = self.dist[current] + self.metric.edge_length(farm, edge);
        if self.dist[end] > distance {
            self.dist[end] = distance;
            self.heap.push(Entry { distance, vertex: end });
            self.parent[end] = Some(edge);
        }
    }
}
