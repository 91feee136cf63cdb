//! Flow initialization: route every turbine to a free substation.
//!
//! Both strategies walk the turbines in id order and run one shortest-path
//! search per still-unserved turbine. They differ in what happens along the
//! path: [NonCollecting] routes exactly the one unit, [Collecting]
//! opportunistically picks up further unserved turbines sitting on the walk.

use crate::dijkstra::{Dijkstra, Target};
use windfarm::{EdgeId, Status, VertexId, Windfarm};

pub trait InitializationStrategy {
    /// Routes one unit from every turbine to some free substation. Returns
    /// [Status::NoFeasibleSolutionFound] when a turbine cannot reach any
    /// free substation.
    fn initialize_flow(&mut self, farm: &mut Windfarm) -> Status;

    /// Resets per-turbine bookkeeping, if the strategy keeps any.
    fn set_turbine_collected(&mut self, _turbine: VertexId, _collected: bool) {}
}

/// Routes one turbine at a time; every path carries exactly one unit.
pub struct NonCollecting {
    dijkstra: Dijkstra,
    target: Target,
}

impl NonCollecting {
    pub fn new(dijkstra: Dijkstra, target: Target) -> NonCollecting {
        NonCollecting { dijkstra, target }
    }
}

impl InitializationStrategy for NonCollecting {
    fn initialize_flow(&mut self, farm: &mut Windfarm) -> Status {
        for index in 0..farm.num_turbines() {
            let turbine = farm.turbines()[index];
            if self.dijkstra.run(farm, turbine, self.target) != Status::Success {
                return Status::NoFeasibleSolutionFound;
            }
            let substation = self
                .dijkstra
                .resolved_target()
                .expect("successful runs resolve their target");
            debug_assert!(farm.is_substation(substation));
            debug_assert!(farm.has_free_substation_capacity(substation));

            let walk = self.dijkstra.extract_walk(farm);
            debug_assert_eq!(farm.end_vertex(*walk.last().unwrap()), substation);

            farm.add_flow_on_walk(&walk, 1);
            farm.add_flow(farm.edge_to_super(substation), 1);
            trace!("INIT\tROUTE\t{}\t{}\t{}", turbine, substation, walk.len());
        }
        Status::Success
    }
}

/// Routes one path per unserved turbine but lets the path pick up other
/// unserved turbines it passes, as long as the remaining edge and
/// substation capacities allow the extra units.
pub struct Collecting {
    dijkstra: Dijkstra,
    target: Target,
    collected: Vec<bool>,
}

impl Collecting {
    pub fn new(dijkstra: Dijkstra, target: Target, farm: &Windfarm) -> Collecting {
        Collecting {
            dijkstra,
            target,
            collected: vec![false; farm.num_vertices()],
        }
    }

    /// For each walk index, the largest load that may pass there: the
    /// minimum of the free substation capacity and the free capacities of
    /// all walk edges from that index onward.
    fn free_capacities(farm: &Windfarm, substation: VertexId, walk: &[EdgeId]) -> Vec<i32> {
        let mut capacities = vec![0; walk.len() + 1];
        let mut propagated = farm.free_substation_capacity(substation);
        debug_assert!(propagated > 0);
        capacities[walk.len()] = propagated;
        for index in (0..walk.len()).rev() {
            let free = farm.free_edge_capacity(walk[index]);
            debug_assert!(free > 0);
            if free < propagated {
                propagated = free;
            }
            capacities[index] = propagated;
        }
        capacities
    }

    fn update_flow_on_walk(&mut self, farm: &mut Windfarm, walk: &[EdgeId], substation: VertexId) {
        let free_capacities = Collecting::free_capacities(farm, substation, walk);

        // Collect as much production on the walk as possible at any point.
        let mut current_flow = 0;
        for (index, &edge) in walk.iter().enumerate() {
            let start = farm.start_vertex(edge);
            debug_assert!(farm.is_turbine(start));
            if !self.collected[start] && current_flow < free_capacities[index] {
                current_flow += 1;
                self.collected[start] = true;
            }
            farm.add_flow(edge, current_flow);
        }
        farm.add_flow(farm.edge_to_super(substation), current_flow);
    }
}

impl InitializationStrategy for Collecting {
    fn initialize_flow(&mut self, farm: &mut Windfarm) -> Status {
        for index in 0..farm.num_turbines() {
            let turbine = farm.turbines()[index];
            if self.collected[turbine] {
                continue;
            }
            if self.dijkstra.run(farm, turbine, self.target) != Status::Success {
                return Status::NoFeasibleSolutionFound;
            }
            let substation = self
                .dijkstra
                .resolved_target()
                .expect("successful runs resolve their target");
            let walk = self.dijkstra.extract_walk(farm);
            debug_assert_eq!(farm.end_vertex(*walk.last().unwrap()), substation);

            self.update_flow_on_walk(farm, &walk, substation);
            trace!("INIT\tCOLLECT\t{}\t{}\t{}", turbine, substation, walk.len());
        }
        Status::Success
    }

    fn set_turbine_collected(&mut self, turbine: VertexId, collected: bool) {
        self.collected[turbine] = collected;
    }
}
