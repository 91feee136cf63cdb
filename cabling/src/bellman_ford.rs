//! Bellman-Ford detection of negative closed walks in the residual graph.
//!
//! The label type decides the variant: with [OneDistanceLabel] this is the
//! textbook algorithm, with [TwoDistancesLabel] the side-trip-free variant
//! that can detect negative cycles longer than 2 without allowing the walk
//! to immediately undo its previous step.
//!
//! All distances are read from the residual costs currently stored in the
//! wind farm, so residual costs must be recomputed before every run.

use crate::labels::{DistanceLabel, OneDistanceLabel, TwoDistancesLabel};
use windfarm::{EdgeId, Status, VertexId, Windfarm};

/// Capability set the canceling driver needs from a detection algorithm.
pub trait CycleDetection {
    /// Runs the detection. Returns [Status::EarlyTermination] if the labels
    /// stabilize (no negative closed walk exists) and [Status::Success]
    /// otherwise.
    fn run(&mut self, farm: &Windfarm) -> Status;

    /// Extracts a negative closed walk that was not returned before, with
    /// `end(walk[i]) == start(walk[i+1])`. Empty when none is left.
    fn extract_negative_closed_walk(&mut self, farm: &Windfarm) -> Vec<EdgeId>;

    /// Recovers a closed walk through `start_edge` by following parents
    /// until `start_edge` repeats. The caller must guarantee that
    /// `start_edge` lies on a closed parent cycle.
    fn traverse_parents_until_edge_repeats(
        &mut self,
        farm: &Windfarm,
        start_edge: EdgeId,
    ) -> Vec<EdgeId>;

    /// Finds a simple tail from `first_edge` back to a vertex of
    /// `closed_walk` by following parents. In the returned vector,
    /// `walk[i+1]` is the parent of `walk[i]`; the last edge is the one
    /// whose start vertex was already visited. If the parent chain repeats
    /// one of its own vertices instead, the enclosed simple cycle is
    /// returned; if a parent is missing, the result is empty.
    fn traverse_parents_until_walk_starts(
        &self,
        farm: &Windfarm,
        closed_walk: &[EdgeId],
        first_edge: EdgeId,
    ) -> Vec<EdgeId>;

    /// Number of successful relaxations in the last [CycleDetection::run].
    fn relaxed_edges_in_last_run(&self) -> usize;
}

pub struct BellmanFord<L> {
    labels: Vec<L>,
    /// Maps an edge to the index of the extraction walk it was part of;
    /// zero means none.
    walk_index: Vec<u32>,
    current_walk: u32,
    updated_since_last_round: Vec<bool>,
    vertex_of_last_update: VertexId,
    early_termination: bool,
    relaxed_edges: usize,
}

/// Textbook Bellman-Ford; finds 2-cycles first.
pub type StandardBellmanFord = BellmanFord<OneDistanceLabel>;

/// Side-trip-free Bellman-Ford on the two-distance labels.
pub type SideTripFreeBellmanFord = BellmanFord<TwoDistancesLabel>;

impl<L: DistanceLabel> BellmanFord<L> {
    pub fn new(farm: &Windfarm) -> BellmanFord<L> {
        BellmanFord {
            labels: vec![L::default(); farm.num_vertices()],
            walk_index: vec![0; farm.num_edges()],
            current_walk: 0,
            updated_since_last_round: vec![true; farm.num_vertices()],
            vertex_of_last_update: farm.num_vertices() - 1,
            early_termination: false,
            relaxed_edges: 0,
        }
    }

    pub fn label_at(&self, vertex: VertexId) -> &L {
        &self.labels[vertex]
    }

    fn reset(&mut self) {
        self.labels.iter_mut().for_each(|label| *label = L::default());
        self.walk_index.iter_mut().for_each(|index| *index = 0);
        self.current_walk = 0;
        self.updated_since_last_round.iter_mut().for_each(|flag| *flag = true);
        self.vertex_of_last_update = self.labels.len() - 1;
        self.early_termination = false;
        self.relaxed_edges = 0;
    }

    /// Seeds every label as if relaxed from a virtual source.
    fn initialize_labels(&mut self, farm: &Windfarm) {
        for edge in 0..farm.num_edges() {
            let end = farm.end_vertex(edge);
            self.labels[end].update(farm.residual_cost(edge), edge);
        }
    }

    fn relax_outgoing_edges(&mut self, farm: &Windfarm, vertex: VertexId) {
        let mut at_least_one_update = false;
        for &edge in farm.outgoing_edges(vertex) {
            let end = farm.end_vertex(edge);
            let distance = self.labels[vertex].distance(farm, edge) + farm.residual_cost(edge);
            let did_update = self.labels[end].update(distance, edge);
            if did_update {
                self.updated_since_last_round[end] = true;
                self.relaxed_edges += 1;
                at_least_one_update = true;
            }
        }
        if at_least_one_update {
            self.vertex_of_last_update = vertex;
        }
    }

    fn on_any_walk(&self, edge: EdgeId) -> bool {
        self.walk_index[edge] != 0
    }

    fn on_current_walk(&self, edge: EdgeId) -> bool {
        self.walk_index[edge] == self.current_walk
    }

    /// A still-relaxable outgoing edge of `vertex`, ignoring edges already
    /// returned on some walk.
    fn find_relaxable_outgoing_edge(&self, farm: &Windfarm, vertex: VertexId) -> Option<EdgeId> {
        for &edge in farm.outgoing_edges(vertex) {
            if self.on_any_walk(edge) {
                continue;
            }
            let end = farm.end_vertex(edge);
            let distance = self.labels[vertex].distance(farm, edge) + farm.residual_cost(edge);
            if self.labels[end].would_update(distance, edge) {
                return Some(edge);
            }
        }
        None
    }

    /// Walks parents backward from `last_edge` until an already-marked edge
    /// shows up. If that edge belongs to the current traversal, the closed
    /// sub-walk is returned in forward order; if it belongs to an earlier
    /// walk, the attempt is dropped and the result is empty.
    fn extract_walk(&mut self, farm: &Windfarm, last_edge: EdgeId) -> Vec<EdgeId> {
        let mut walk = Vec::new();
        let mut current = last_edge;

        while !self.on_any_walk(current) {
            walk.push(current);
            self.walk_index[current] = self.current_walk;
            let start = farm.start_vertex(current);
            match self.labels[start].parent(farm, current) {
                Some(parent) => {
                    debug_assert_eq!(farm.end_vertex(parent), start);
                    current = parent;
                }
                None => return Vec::new(),
            }
        }

        if !self.on_current_walk(current) {
            return Vec::new();
        }
        let first_occurrence = match walk.iter().position(|&edge| edge == current) {
            Some(index) => index,
            None => return Vec::new(),
        };
        // walk holds the edges in parent order; the closed part runs from
        // the first occurrence of the repeated edge to the end. Reverse it
        // so that consecutive edges connect head to tail.
        let mut closed = walk[first_occurrence..].to_vec();
        closed.reverse();
        debug_assert_eq!(
            farm.start_vertex(closed[0]),
            farm.end_vertex(*closed.last().expect("closed walk is non-empty"))
        );
        closed
    }
}

impl<L: DistanceLabel> CycleDetection for BellmanFord<L> {
    fn run(&mut self, farm: &Windfarm) -> Status {
        self.reset();
        self.initialize_labels(farm);

        for _round in 0..L::rounds(farm.num_vertices()) {
            for vertex in 0..farm.num_vertices() {
                if vertex == self.vertex_of_last_update {
                    // No label changed since this vertex was relaxed last
                    // round; the distances are final.
                    self.early_termination = true;
                    return Status::EarlyTermination;
                }
                if self.updated_since_last_round[vertex] {
                    self.relax_outgoing_edges(farm, vertex);
                    self.updated_since_last_round[vertex] = false;
                }
            }
        }
        Status::Success
    }

    fn extract_negative_closed_walk(&mut self, farm: &Windfarm) -> Vec<EdgeId> {
        if self.early_termination {
            return Vec::new();
        }
        self.current_walk += 1;

        for vertex in 0..farm.num_vertices() {
            if let Some(relaxable) = self.find_relaxable_outgoing_edge(farm, vertex) {
                let walk = self.extract_walk(farm, relaxable);
                if !walk.is_empty() {
                    return walk;
                }
                self.current_walk += 1;
            }
        }
        Vec::new()
    }

    fn traverse_parents_until_edge_repeats(
        &mut self,
        farm: &Windfarm,
        start_edge: EdgeId,
    ) -> Vec<EdgeId> {
        if self.early_termination {
            return Vec::new();
        }
        self.current_walk = 1;

        let mut walk = Vec::new();
        let mut current = start_edge;
        loop {
            debug_assert!(!self.on_any_walk(current));
            self.walk_index[current] = self.current_walk;
            walk.push(current);
            let start = farm.start_vertex(current);
            current = match self.labels[start].parent(farm, current) {
                Some(parent) => parent,
                None => break,
            };
            if current == walk[0] {
                break;
            }
        }
        walk
    }

    fn traverse_parents_until_walk_starts(
        &self,
        farm: &Windfarm,
        closed_walk: &[EdgeId],
        first_edge: EdgeId,
    ) -> Vec<EdgeId> {
        let mut walk = Vec::new();
        let mut visited = vec![false; farm.num_vertices()];
        let mut on_closed_walk = vec![false; farm.num_vertices()];
        for &edge in closed_walk {
            on_closed_walk[farm.end_vertex(edge)] = true;
        }

        let mut current = Some(first_edge);
        visited[farm.end_vertex(first_edge)] = true;
        while let Some(edge) = current {
            walk.push(edge);
            let start = farm.start_vertex(edge);
            if on_closed_walk[start] {
                // A simple path between two vertices of the closed walk.
                return walk;
            }
            if visited[start] {
                // The parent chain closed a simple cycle of its own; cut it
                // out and return it.
                let mut index = walk.len() - 1;
                while farm.end_vertex(walk[index]) != start {
                    index -= 1;
                }
                let cycle = walk[index..].to_vec();
                debug_assert_eq!(
                    farm.end_vertex(cycle[0]),
                    farm.start_vertex(*cycle.last().expect("cycle is non-empty"))
                );
                return cycle;
            }
            visited[start] = true;
            current = self.labels[start].parent(farm, edge);
        }
        Vec::new()
    }

    fn relaxed_edges_in_last_run(&self) -> usize {
        self.relaxed_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;
    use crate::residual::{ResidualCostComputer, StandardCosts};

    #[test]
    fn early_termination_without_negative_cycles() {
        let mut farm = mocks::single_link_farm();
        mocks::route_unit(&mut farm, &[0]);
        StandardCosts.compute_residual_costs(&mut farm, 1);

        let mut detection = SideTripFreeBellmanFord::new(&farm);
        assert_eq!(detection.run(&farm), Status::EarlyTermination);
        assert!(detection.extract_negative_closed_walk(&farm).is_empty());
    }

    #[test]
    fn standard_labels_find_two_cycles_first() {
        // A 2-cycle: forward edge gets cheaper, reverse of a parallel path
        // more expensive. Handcrafted residual costs, no flow semantics.
        let mut farm = mocks::triangle_farm();
        for edge in 0..farm.num_edges() {
            farm.set_residual_cost(edge, f64::INFINITY);
        }
        // edge 0 (t0 -> s) and its reverse form a negative 2-cycle
        farm.set_residual_cost(0, -5.0);
        farm.set_residual_cost(farm.reverse_edge(0), 1.0);

        let mut detection = StandardBellmanFord::new(&farm);
        assert_eq!(detection.run(&farm), Status::Success);
        let walk = detection.extract_negative_closed_walk(&farm);
        assert_eq!(walk.len(), 2);
        assert!(walk.contains(&0));
        assert!(walk.contains(&farm.reverse_edge(0)));
    }

    #[test]
    fn side_trip_free_labels_find_triangle() {
        // Negative 3-cycle t0 -> t1 -> s -> t0 in residual costs.
        let mut farm = mocks::triangle_farm();
        for edge in 0..farm.num_edges() {
            farm.set_residual_cost(edge, 10.0);
        }
        let t0_t1 = 2;
        let t1_s = 1;
        let s_t0 = farm.reverse_edge(0);
        farm.set_residual_cost(t0_t1, -1.0);
        farm.set_residual_cost(t1_s, -1.0);
        farm.set_residual_cost(s_t0, -1.0);

        let mut detection = SideTripFreeBellmanFord::new(&farm);
        assert_eq!(detection.run(&farm), Status::Success);
        let walk = detection.extract_negative_closed_walk(&farm);
        assert!(walk.len() >= 3);
        for window in walk.windows(2) {
            assert_eq!(farm.end_vertex(window[0]), farm.start_vertex(window[1]));
        }
        assert_eq!(
            farm.end_vertex(*walk.last().unwrap()),
            farm.start_vertex(walk[0])
        );
        let cost: f64 = walk.iter().map(|&e| farm.residual_cost(e)).sum();
        assert!(cost < 0.0);
    }

    #[test]
    fn walks_are_not_returned_twice() {
        let mut farm = mocks::triangle_farm();
        for edge in 0..farm.num_edges() {
            farm.set_residual_cost(edge, 10.0);
        }
        farm.set_residual_cost(2, -1.0);
        farm.set_residual_cost(1, -1.0);
        farm.set_residual_cost(farm.reverse_edge(0), -1.0);

        let mut detection = SideTripFreeBellmanFord::new(&farm);
        assert_eq!(detection.run(&farm), Status::Success);
        let first = detection.extract_negative_closed_walk(&farm);
        assert!(!first.is_empty());
        // The same walk is never handed out again.
        let second = detection.extract_negative_closed_walk(&farm);
        assert!(second.iter().all(|edge| !first.contains(edge)));
    }
}
