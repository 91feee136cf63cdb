//! The bonbon escape: a recorded unhelpful closed walk is revisited and
//! repaired. For every negative edge on the walk, the strategy looks for a
//! different tail leading back onto the walk such that tail plus walk
//! slice form a cancelable negative cycle of length above 2.

use crate::bellman_ford::CycleDetection;
use crate::ncc::NegativeCycleCanceling;
use crate::residual::{AdaptedCosts, ResidualCostComputer};
use windfarm::{assert_feasible_flow, EdgeId, Status, Windfarm};

pub struct BonbonsEscape {
    pub(crate) calls: u32,
    bonbon: Vec<EdgeId>,
    /// For each vertex, the first walk edge entering it, seeded from the
    /// current negative edge backward so that combining with a tail keeps
    /// the result simple.
    first_edge_entering_vertex: Vec<Option<EdgeId>>,
}

impl BonbonsEscape {
    pub fn new(farm: &Windfarm) -> BonbonsEscape {
        BonbonsEscape {
            calls: 0,
            bonbon: Vec::new(),
            first_edge_entering_vertex: vec![None; farm.num_vertices()],
        }
    }

    pub(crate) fn apply(
        &mut self,
        farm: &mut Windfarm,
        core: &mut NegativeCycleCanceling,
        costs: &mut AdaptedCosts,
    ) -> Status {
        let (delta, edge_on_bonbon) = match core.bonbon {
            Some(record) => record,
            None => return Status::NothingChanged,
        };

        self.recover_bonbon(farm, core, costs, delta, edge_on_bonbon);

        for index in 0..self.bonbon.len().saturating_sub(1) {
            if farm.residual_cost(self.bonbon[index]) >= 0.0 {
                continue;
            }
            trace!("BONBON\tNEGATIVE_EDGE\t{}", self.bonbon[index]);
            self.seed_first_edges_entering_vertices(farm, index);
            if self.check_all_incoming_edges_for_tail(farm, core, costs, index, delta)
                == Status::Success
            {
                return Status::Success;
            }
        }
        Status::NothingChanged
    }

    /// Re-runs detection at the recorded delta and walks the parent chain
    /// from the recorded edge to materialize the bonbon again.
    fn recover_bonbon(
        &mut self,
        farm: &mut Windfarm,
        core: &mut NegativeCycleCanceling,
        costs: &mut AdaptedCosts,
        delta: i32,
        edge_on_bonbon: EdgeId,
    ) {
        costs.compute_residual_costs(farm, delta);
        let detection_code = core.detection.run(farm);
        debug_assert_eq!(detection_code, Status::Success);
        let _ = detection_code;

        self.bonbon = core.detection.traverse_parents_until_edge_repeats(farm, edge_on_bonbon);
        debug_assert!(self.bonbon.len() > 1);
        debug!("BONBON\tRECOVERED\t{}\t{}", delta, self.bonbon.len());
    }

    /// Rebuilds the per-vertex entering-edge map, walking the bonbon from
    /// the current negative edge backward, then the remainder forward.
    fn seed_first_edges_entering_vertices(&mut self, farm: &Windfarm, current_index: usize) {
        debug_assert!(current_index < self.bonbon.len());
        for entry in self.first_edge_entering_vertex.iter_mut() {
            *entry = None;
        }
        let mut index = current_index;
        loop {
            self.record_entering_edge(farm, self.bonbon[index]);
            if index == 0 {
                break;
            }
            index -= 1;
        }
        index = self.bonbon.len() - 1;
        while index > current_index {
            self.record_entering_edge(farm, self.bonbon[index]);
            index -= 1;
        }
    }

    fn record_entering_edge(&mut self, farm: &Windfarm, edge: EdgeId) {
        let end = farm.end_vertex(edge);
        if self.first_edge_entering_vertex[end].is_none() {
            self.first_edge_entering_vertex[end] = Some(edge);
        }
    }

    /// Tries every edge entering the start of the negative edge as the
    /// endpoint of an alternative tail.
    fn check_all_incoming_edges_for_tail(
        &mut self,
        farm: &mut Windfarm,
        core: &mut NegativeCycleCanceling,
        costs: &mut AdaptedCosts,
        index_of_negative_edge: usize,
        delta: i32,
    ) -> Status {
        let negative_edge = self.bonbon[index_of_negative_edge];
        let start = farm.start_vertex(negative_edge);

        for outgoing_index in 0..farm.outgoing_edges(start).len() {
            let outgoing = farm.outgoing_edges(start)[outgoing_index];
            if outgoing == negative_edge {
                // would close a cycle of length 2
                continue;
            }
            let incoming = farm.reverse_edge(outgoing);
            let tail =
                core.detection.traverse_parents_until_walk_starts(farm, &self.bonbon, incoming);
            if tail.is_empty() {
                continue;
            }
            if self.combine_tail_and_bonbon(farm, costs, &tail, delta) == Status::Success {
                return Status::Success;
            }
        }
        Status::NothingChanged
    }

    /// Cancels the tail alone if it happens to be a negative closed walk;
    /// otherwise completes it along the bonbon and cancels the combination
    /// when it is negative and longer than 2. The combined walk is only
    /// simple up to how the entering-edge map was seeded.
    fn combine_tail_and_bonbon(
        &mut self,
        farm: &mut Windfarm,
        costs: &mut AdaptedCosts,
        tail: &[EdgeId],
        delta: i32,
    ) -> Status {
        let cost_of_tail: f64 = tail.iter().map(|&edge| farm.residual_cost(edge)).sum();

        let last = *tail.last().expect("tails are non-empty");
        if farm.end_vertex(tail[0]) == farm.start_vertex(last) {
            if cost_of_tail < 0.0 {
                debug!("BONBON\tCLOSED_TAIL\t{}\t{}", tail.len(), cost_of_tail);
                farm.add_flow_on_walk(tail, delta);
                if cfg!(debug_assertions) {
                    assert_feasible_flow(farm);
                }
                return Status::Success;
            }
            return Status::NothingChanged;
        }

        let mut cumulative_cost = cost_of_tail;
        let mut edges_to_cancel = tail.len();
        let mut current = last;
        let mut part_of_bonbon = Vec::new();

        while farm.start_vertex(current) != farm.end_vertex(tail[0]) {
            current = match self.first_edge_entering_vertex[farm.start_vertex(current)] {
                Some(edge) => edge,
                None => return Status::NothingChanged,
            };
            cumulative_cost += farm.residual_cost(current);
            edges_to_cancel += 1;
            part_of_bonbon.push(current);
        }

        if cumulative_cost < 0.0 && edges_to_cancel > 2 {
            debug!("BONBON\tCOMBINED\t{}\t{}", edges_to_cancel, cumulative_cost);
            farm.add_flow_on_walk(tail, delta);
            farm.add_flow_on_walk(&part_of_bonbon, delta);
            if cfg!(debug_assertions) {
                assert_feasible_flow(farm);
            }
            costs.clear_overrides();
            return Status::Success;
        }
        Status::NothingChanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bellman_ford::StandardBellmanFord;
    use crate::delta::IncreasingDelta;
    use crate::dijkstra::{Dijkstra, EdgeMetric, Target};
    use crate::init::NonCollecting;
    use crate::mocks;
    use crate::report::DummyLogger;

    fn core_with_standard_detection(farm: &Windfarm) -> NegativeCycleCanceling {
        let dijkstra = Dijkstra::new(farm, EdgeMetric::Euclidean);
        let init = NonCollecting::new(dijkstra, Target::AnyFreeSubstation);
        NegativeCycleCanceling::new(
            farm,
            Box::new(init),
            Box::new(IncreasingDelta::new(2 * farm.cables().max_capacity())),
            Box::new(StandardBellmanFord::new(farm)),
            f64::INFINITY,
        )
    }

    #[test]
    fn without_a_record_nothing_happens() {
        let mut farm = mocks::single_link_farm();
        let mut core = core_with_standard_detection(&farm);
        let mut escape = BonbonsEscape::new(&farm);
        let mut costs = AdaptedCosts::new();
        assert_eq!(escape.apply(&mut farm, &mut core, &mut costs), Status::NothingChanged);
    }

    #[test]
    fn two_cycle_walks_leave_a_bonbon_record() {
        // On a single routed link, textbook labels detect the negative
        // 2-cycle forward/refund walk, which no pass can cancel.
        let mut farm = mocks::single_link_farm();
        mocks::route_unit(&mut farm, &[0]);
        let mut core = core_with_standard_detection(&farm);
        let mut costs = AdaptedCosts::new();
        let result = core.single_delta_pass(&mut farm, &mut costs, 1, &mut DummyLogger, true);
        assert_eq!(result, Status::NothingChanged);
        let (delta, edge) = core.bonbon.expect("uncanceled walk leaves a record");
        assert_eq!(delta, 1);
        assert!(edge == 0 || edge == farm.reverse_edge(0));
    }

    #[test]
    fn bonbon_recovery_terminates_without_a_repair() {
        let mut farm = mocks::single_link_farm();
        mocks::route_unit(&mut farm, &[0]);
        let mut core = core_with_standard_detection(&farm);
        let mut costs = AdaptedCosts::new();
        let _ = core.single_delta_pass(&mut farm, &mut costs, 1, &mut DummyLogger, true);
        assert!(core.bonbon.is_some());

        let flow_before: Vec<_> = (0..farm.num_edges()).map(|e| farm.flow(e)).collect();
        let mut escape = BonbonsEscape::new(&farm);
        // There is no alternative tail on this graph, so the strategy
        // reports no change and the flow stays untouched.
        assert_eq!(escape.apply(&mut farm, &mut core, &mut costs), Status::NothingChanged);
        for edge in 0..farm.num_edges() {
            assert_eq!(farm.flow(edge), flow_before[edge]);
        }
        assert_feasible_flow(&farm);
    }
}
