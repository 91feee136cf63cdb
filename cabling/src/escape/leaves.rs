//! The leaf-rerouting escape: a turbine whose whole production leaves over
//! a single edge, even though a strictly shorter outgoing edge exists, is
//! moved onto the shorter edge whenever a substation with room can be
//! reached from there along existing flow.

use crate::residual::{AdaptedCosts, CostOverrides};
use windfarm::{assert_feasible_flow, EdgeId, Status, VertexId, Windfarm};

/// A turbine with no incoming flow whose production is not routed via the
/// shortest of its outgoing edges.
#[derive(Debug, Clone)]
struct LeafTurbine {
    turbine: VertexId,
    current_edge: EdgeId,
    shorter_edge: EdgeId,
    used: bool,
}

enum Probe {
    Found,
    DeadEnd,
    CanceledCycle,
}

pub struct LeavesEscape {
    pub(crate) calls: u32,
    /// For each vertex, the substations that can reach it along edges
    /// carrying flow.
    substations_reaching: Vec<Vec<VertexId>>,
    leaves: Vec<LeafTurbine>,
}

impl LeavesEscape {
    pub fn new(farm: &Windfarm) -> LeavesEscape {
        LeavesEscape {
            calls: 0,
            substations_reaching: vec![Vec::new(); farm.num_vertices()],
            leaves: Vec::new(),
        }
    }

    pub(crate) fn apply(&mut self, farm: &mut Windfarm, costs: &mut AdaptedCosts) -> Status {
        self.identify_substation_assignment(farm);
        self.identify_leaf_turbines(farm);
        self.successively_move_leaves(farm, costs)
    }

    /// Breadth-first search from every substation along edges with nonzero
    /// flow; records which substations currently serve which turbines.
    fn identify_substation_assignment(&mut self, farm: &Windfarm) {
        for list in self.substations_reaching.iter_mut() {
            list.clear();
        }

        for index in 0..farm.num_substations() {
            let substation = farm.substations()[index];
            self.substations_reaching[substation].push(substation);
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(substation);

            while let Some(vertex) = queue.pop_front() {
                for &edge in farm.outgoing_edges(vertex) {
                    if farm.flow(edge) == 0 {
                        continue;
                    }
                    let end = farm.end_vertex(edge);
                    if self.substations_reaching[end].last() == Some(&substation) {
                        continue;
                    }
                    if farm.is_turbine(end) {
                        queue.push_back(end);
                        self.substations_reaching[end].push(substation);
                    } else if farm.is_substation(end) {
                        self.substations_reaching[end].push(substation);
                    }
                    // the super substation is not tracked
                }
            }
        }
    }

    fn identify_leaf_turbines(&mut self, farm: &Windfarm) {
        self.leaves.clear();
        for &turbine in farm.turbines() {
            let current_edge = match unique_outgoing_edge_with_flow(farm, turbine) {
                Some(edge) => edge,
                None => continue,
            };
            if let Some(shorter_edge) = shorter_outgoing_edge(farm, turbine, current_edge) {
                self.leaves.push(LeafTurbine {
                    turbine,
                    current_edge,
                    shorter_edge,
                    used: false,
                });
            }
        }
        debug!("LEAVES\tFOUND\t{}", self.leaves.len());
    }

    fn moving_leaf_is_feasible(&self, farm: &Windfarm, leaf: &LeafTurbine) -> bool {
        self.moving_might_keep_assignment(farm, leaf)
            || self.new_substation_has_free_capacity(farm, leaf)
    }

    /// The vertex behind the shorter edge already shares a serving
    /// substation with the leaf turbine.
    fn moving_might_keep_assignment(&self, farm: &Windfarm, leaf: &LeafTurbine) -> bool {
        let candidates = &self.substations_reaching[farm.end_vertex(leaf.shorter_edge)];
        candidates
            .iter()
            .any(|candidate| self.substations_reaching[leaf.turbine].contains(candidate))
    }

    fn new_substation_has_free_capacity(&self, farm: &Windfarm, leaf: &LeafTurbine) -> bool {
        self.substations_reaching[farm.end_vertex(leaf.shorter_edge)]
            .iter()
            .any(|&substation| farm.has_free_substation_capacity(substation))
    }

    fn successively_move_leaves(
        &mut self,
        farm: &mut Windfarm,
        costs: &mut AdaptedCosts,
    ) -> Status {
        let leaves_to_start_with = self.leaves.len();
        let mut new_costs = CostOverrides::default();

        let mut changed_the_flow = true;
        while changed_the_flow && !self.leaves.is_empty() {
            changed_the_flow = false;
            for index in 0..self.leaves.len() {
                let leaf = self.leaves[index].clone();
                if self.moving_leaf_is_feasible(farm, &leaf) {
                    changed_the_flow |= self.reroute_leaf(farm, index, &mut new_costs);
                }
            }
            if changed_the_flow {
                self.leaves.retain(|leaf| !leaf.used);
            }
            debug!("LEAVES\tREMAINING\t{}", self.leaves.len());
        }

        if self.leaves.len() == leaves_to_start_with {
            Status::NothingChanged
        } else {
            costs.copy_overrides(new_costs);
            Status::Success
        }
    }

    /// Moves the leaf onto its shorter edge if a path to its old substation
    /// and a path from the shorter edge to a substation with room exist.
    fn reroute_leaf(
        &mut self,
        farm: &mut Windfarm,
        leaf_index: usize,
        new_costs: &mut CostOverrides,
    ) -> bool {
        let leaf = self.leaves[leaf_index].clone();

        let path_to_previous = inverted_path_to_previous_substation(farm, leaf.current_edge);
        debug_assert!(!path_to_previous.is_empty());
        let previous_substation = farm.end_vertex(path_to_previous[0]);
        debug_assert!(farm.is_substation(previous_substation));

        let path_to_new =
            inverted_path_to_new_substation(farm, leaf.shorter_edge, previous_substation);
        if path_to_new.is_empty() {
            return false;
        }

        change_flow_on_path_and_drain(farm, path_to_previous, -1);
        change_flow_on_path_and_drain(farm, path_to_new, 1);
        if cfg!(debug_assertions) {
            assert_feasible_flow(farm);
        }

        build_free_leaf_edge_override(farm, new_costs, leaf.shorter_edge);

        self.leaves[leaf_index].used = true;
        let assignment = self.substations_reaching[farm.end_vertex(leaf.shorter_edge)].clone();
        self.substations_reaching[farm.start_vertex(leaf.shorter_edge)] = assignment;
        debug!("LEAVES\tMOVED\t{}\t{}\t{}", leaf.turbine, leaf.current_edge, leaf.shorter_edge);
        true
    }
}

/// The only outgoing edge of the vertex carrying nonzero flow, if it is
/// indeed unique.
fn unique_outgoing_edge_with_flow(farm: &Windfarm, vertex: VertexId) -> Option<EdgeId> {
    let mut unique = None;
    for &edge in farm.outgoing_edges(vertex) {
        if farm.flow(edge) != 0 {
            if unique.is_some() {
                return None;
            }
            unique = Some(edge);
        }
    }
    unique
}

/// The last outgoing edge strictly shorter than the edge carrying the
/// flow. All other outgoing edges carry no flow here.
fn shorter_outgoing_edge(farm: &Windfarm, vertex: VertexId, edge_with_flow: EdgeId) -> Option<EdgeId> {
    debug_assert_eq!(farm.start_vertex(edge_with_flow), vertex);
    debug_assert_eq!(farm.flow(edge_with_flow), 1);
    let mut shorter = None;
    let current_length = farm.length(edge_with_flow);
    for &edge in farm.outgoing_edges(vertex) {
        if edge != edge_with_flow && farm.length(edge) < current_length {
            shorter = Some(edge);
        }
    }
    debug_assert!(shorter.map_or(true, |edge| farm.flow(edge) == 0));
    shorter
}

/// Walks along positive flow from `start_edge` to a substation. The result
/// is inverted: the first entry ends in the substation, the last entry is
/// `start_edge`. Positive-flow cycles discovered on the way are canceled
/// and the search restarts.
fn inverted_path_to_previous_substation(farm: &mut Windfarm, start_edge: EdgeId) -> Vec<EdgeId> {
    loop {
        let mut path = Vec::new();
        let mut explored = vec![false; farm.num_edges()];
        match probe_towards_previous(farm, &mut explored, &mut path, start_edge, start_edge) {
            Probe::CanceledCycle => continue,
            _ => return path,
        }
    }
}

fn probe_towards_previous(
    farm: &mut Windfarm,
    explored: &mut [bool],
    path: &mut Vec<EdgeId>,
    edge: EdgeId,
    first_edge: EdgeId,
) -> Probe {
    if explored[edge] {
        cancel_cycle_with_positive_flow(farm, edge, first_edge);
        return Probe::CanceledCycle;
    }
    explored[edge] = true;

    let end = farm.end_vertex(edge);
    if farm.is_substation(end) {
        path.push(edge);
        return Probe::Found;
    }

    for index in 0..farm.outgoing_edges(end).len() {
        let outgoing = farm.outgoing_edges(end)[index];
        if outgoing == farm.reverse_edge(edge) || farm.flow(outgoing) <= 0 {
            continue;
        }
        match probe_towards_previous(farm, explored, path, outgoing, first_edge) {
            Probe::Found => {
                path.push(edge);
                return Probe::Found;
            }
            Probe::CanceledCycle => return Probe::CanceledCycle,
            Probe::DeadEnd => {}
        }
    }
    Probe::DeadEnd
}

/// Walks along positive flow with free capacity from `start_edge` to a
/// substation that has room (or equals `previous_substation`). Cycles are
/// canceled but the search keeps going. Empty when nothing is reachable.
fn inverted_path_to_new_substation(
    farm: &mut Windfarm,
    start_edge: EdgeId,
    previous_substation: VertexId,
) -> Vec<EdgeId> {
    let mut path = Vec::new();
    let mut explored = vec![false; farm.num_edges()];
    probe_towards_new(farm, &mut explored, &mut path, start_edge, start_edge, previous_substation);
    path
}

fn probe_towards_new(
    farm: &mut Windfarm,
    explored: &mut [bool],
    path: &mut Vec<EdgeId>,
    edge: EdgeId,
    first_edge: EdgeId,
    previous_substation: VertexId,
) -> Probe {
    if explored[edge] {
        cancel_cycle_with_positive_flow(farm, edge, first_edge);
        return Probe::DeadEnd;
    }
    explored[edge] = true;

    let end = farm.end_vertex(edge);
    if farm.is_substation(end) {
        if farm.has_free_substation_capacity(end) || end == previous_substation {
            path.push(edge);
            return Probe::Found;
        }
        return Probe::DeadEnd;
    }

    for index in 0..farm.outgoing_edges(end).len() {
        let outgoing = farm.outgoing_edges(end)[index];
        if outgoing == farm.reverse_edge(edge)
            || !farm.has_free_edge_capacity(outgoing)
            || farm.flow(outgoing) <= 0
        {
            // A saturated edge whose reverse lies on the path to the old
            // substation would gain capacity from the move, but that
            // opportunity is not chased here.
            continue;
        }
        if let Probe::Found = probe_towards_new(
            farm,
            explored,
            path,
            outgoing,
            first_edge,
            previous_substation,
        ) {
            path.push(edge);
            return Probe::Found;
        }
    }
    Probe::DeadEnd
}

/// Cancels the positive-flow cycle through `edge_on_cycle` by subtracting
/// the minimum flow found on it.
fn cancel_cycle_with_positive_flow(farm: &mut Windfarm, edge_on_cycle: EdgeId, first_edge: EdgeId) {
    let mut next_edge = vec![None; farm.num_edges()];
    let mut seen_repeat = false;
    populate_next_edges(farm, edge_on_cycle, first_edge, &mut seen_repeat, &mut next_edge);

    let mut cycle = Vec::new();
    let mut edge = edge_on_cycle;
    loop {
        cycle.push(edge);
        edge = match next_edge[edge] {
            Some(next) => next,
            None => break,
        };
        if edge == cycle[0] {
            break;
        }
    }

    let delta = farm.min_flow_on_edges(&cycle);
    farm.add_flow_on_walk(&cycle, -delta);
    debug!("LEAVES\tCYCLE\t{}\t{}", cycle.len(), delta);
}

/// Depth-first search along positive flow that records successor pointers
/// until `edge_to_repeat` is reached a second time.
fn populate_next_edges(
    farm: &Windfarm,
    edge_to_repeat: EdgeId,
    edge_to_explore: EdgeId,
    seen_repeat: &mut bool,
    next_edge: &mut [Option<EdgeId>],
) -> bool {
    if farm.is_substation(farm.end_vertex(edge_to_explore)) {
        return false;
    }
    if edge_to_explore == edge_to_repeat {
        if *seen_repeat {
            return true;
        }
        *seen_repeat = true;
    }
    let end = farm.end_vertex(edge_to_explore);
    for &outgoing in farm.outgoing_edges(end) {
        if outgoing == farm.reverse_edge(edge_to_explore) || farm.flow(outgoing) <= 0 {
            continue;
        }
        if populate_next_edges(farm, edge_to_repeat, outgoing, seen_repeat, next_edge) {
            next_edge[edge_to_explore] = Some(outgoing);
            return true;
        }
    }
    false
}

/// Applies the flow change along the inverted path plus the drain edge of
/// the substation it ends in.
fn change_flow_on_path_and_drain(farm: &mut Windfarm, mut path: Vec<EdgeId>, delta: i32) {
    let substation = farm.end_vertex(path[0]);
    path.push(farm.edge_to_super(substation));
    farm.add_flow_on_walk(&path, delta);
}

/// Grants the moved unit on the new leaf edge a free ride: an adapted
/// cable table under which removing that unit refunds nothing.
fn build_free_leaf_edge_override(
    farm: &Windfarm,
    new_costs: &mut CostOverrides,
    new_edge: EdgeId,
) {
    let mut adapted = farm.cables().expanded_costs().to_vec();
    let mid = adapted.len() / 2;
    let first_cable_cost = adapted[mid - 1];
    for k in (0..mid).rev() {
        if adapted[k] != 0 {
            adapted[k] -= first_cable_cost;
        }
    }
    new_costs.add_edge(farm.reverse_edge(new_edge), adapted.clone());

    let mut reversed = adapted;
    reversed.reverse();
    new_costs.add_edge(new_edge, reversed);
}
