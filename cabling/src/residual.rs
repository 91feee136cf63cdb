//! Residual costs: the marginal cost of pushing delta more units over an
//! edge, parametric in the delta currently being tried.
//!
//! Three computers share the base formula. [StandardCosts] is the plain
//! one; [AdaptedCosts] applies per-edge cable-table overrides on top (used
//! by the escaping driver so that escaped moves are not undone right away);
//! [FreeSatisfiedCosts] grants saturated edges a free upgrade for one pass
//! and records the matching overrides while cycles are canceled.

use windfarm::cables::Cabletypes;
use windfarm::{EdgeId, Windfarm};

/// Adapted cable table for a single edge.
pub struct CostOverride {
    pub edge: EdgeId,
    pub cables: Cabletypes,
}

/// Adapted cable tables for several edges. Applied as a post-pass over the
/// standard residual costs.
#[derive(Default)]
pub struct CostOverrides {
    entries: Vec<CostOverride>,
}

impl CostOverrides {
    pub fn add_edge(&mut self, edge: EdgeId, expanded_costs: Vec<i32>) {
        let cables = Cabletypes::from_expanded(expanded_costs)
            .expect("adapted cost vectors stay monotone from the midpoint");
        self.entries.push(CostOverride { edge, cables });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CostOverride] {
        &self.entries
    }
}

/// Capability set the canceling driver needs from a residual-cost computer.
pub trait ResidualCostComputer {
    /// Rewrites the residual cost of every edge for the given delta.
    fn compute_residual_costs(&mut self, farm: &mut Windfarm, delta: i32);

    /// Called for each edge of a cycle right before the delta is applied to
    /// it. Only the free-cable computer does anything here.
    fn create_new_cable_type_while_canceling(
        &mut self,
        _farm: &Windfarm,
        _edge: EdgeId,
        _delta: i32,
    ) {
    }
}

/// Residual cost of one edge under a given cable table.
fn residual_cost(farm: &Windfarm, edge: EdgeId, delta: i32, cables: &Cabletypes) -> f64 {
    let start = farm.start_vertex(edge);
    let end = farm.end_vertex(edge);

    if farm.is_super_substation(start) {
        // Reducing the inflow of the substation behind this edge is free,
        // but it can never drop below zero.
        debug_assert!(farm.is_substation(end));
        let flow_to_substation = -farm.flow(edge);
        debug_assert!(flow_to_substation >= 0);
        return if delta <= flow_to_substation { 0.0 } else { f64::INFINITY };
    }
    if farm.is_super_substation(end) {
        debug_assert!(farm.is_substation(start));
        return if delta <= farm.free_substation_capacity(start) { 0.0 } else { f64::INFINITY };
    }

    non_super_residual_cost(farm, edge, delta, cables)
}

/// The non-super-substation case, shared with the override post-pass.
fn non_super_residual_cost(
    farm: &Windfarm,
    edge: EdgeId,
    delta: i32,
    cables: &Cabletypes,
) -> f64 {
    let start = farm.start_vertex(edge);
    let remaining_capacity = if farm.is_substation(start) {
        // The edge runs from a substation back to a turbine; at most the
        // flow arriving at the substation over it can be redirected.
        -farm.flow(edge)
    } else {
        farm.free_edge_capacity(edge)
    };

    if delta <= remaining_capacity {
        let flow = farm.flow(edge);
        (cables.cost_of_flow(flow + delta) - cables.cost_of_flow(flow)) as f64 * farm.length(edge)
    } else {
        f64::INFINITY
    }
}

fn compute_standard(farm: &mut Windfarm, delta: i32) {
    for edge in 0..farm.num_edges() {
        let cost = residual_cost(farm, edge, delta, farm.cables());
        farm.set_residual_cost(edge, cost);
    }
}

/// The plain residual costs used by single-run NCC.
pub struct StandardCosts;

impl ResidualCostComputer for StandardCosts {
    fn compute_residual_costs(&mut self, farm: &mut Windfarm, delta: i32) {
        compute_standard(farm, delta);
    }
}

/// Standard residual costs plus per-edge overrides from escaping
/// strategies.
#[derive(Default)]
pub struct AdaptedCosts {
    overrides: CostOverrides,
}

impl AdaptedCosts {
    pub fn new() -> AdaptedCosts {
        AdaptedCosts::default()
    }

    /// Replaces the override collection, e.g. with the adaptations built by
    /// the leaf-moving strategy.
    pub fn copy_overrides(&mut self, overrides: CostOverrides) {
        self.overrides = overrides;
    }

    /// Moves the override collection built up by a free-cables pass into
    /// this computer, leaving the source empty.
    pub fn steal_from(&mut self, source: &mut FreeSatisfiedCosts) {
        std::mem::swap(&mut self.overrides, &mut source.in_construction);
        source.in_construction.clear();
    }

    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    pub fn overrides(&self) -> &CostOverrides {
        &self.overrides
    }
}

impl ResidualCostComputer for AdaptedCosts {
    fn compute_residual_costs(&mut self, farm: &mut Windfarm, delta: i32) {
        compute_standard(farm, delta);
        for entry in self.overrides.entries() {
            let cost = non_super_residual_cost(farm, entry.edge, delta, &entry.cables);
            farm.set_residual_cost(entry.edge, cost);
        }
    }
}

/// The free-cables computer: after the standard pass, every original-range
/// edge whose upgrade would be feasible but costly is marked saturated and
/// its residual cost zeroed. While a cycle over such an edge is canceled,
/// an adapted cable table is recorded that keeps the granted upgrade free
/// in later iterations.
pub struct FreeSatisfiedCosts {
    saturated: Vec<bool>,
    pub(crate) in_construction: CostOverrides,
}

impl FreeSatisfiedCosts {
    pub fn new(farm: &Windfarm) -> FreeSatisfiedCosts {
        FreeSatisfiedCosts {
            saturated: vec![false; farm.num_edges()],
            in_construction: CostOverrides::default(),
        }
    }

    pub fn overrides_in_construction(&self) -> &CostOverrides {
        &self.in_construction
    }
}

impl ResidualCostComputer for FreeSatisfiedCosts {
    fn compute_residual_costs(&mut self, farm: &mut Windfarm, delta: i32) {
        compute_standard(farm, delta);

        for edge in 0..2 * farm.num_original_edges() {
            debug_assert!(!farm.is_super_substation(farm.start_vertex(edge)));
            debug_assert!(!farm.is_super_substation(farm.end_vertex(edge)));
            let cost = farm.residual_cost(edge);
            if farm.flow(edge) != 0 && cost > 0.0 && cost.is_finite() {
                farm.set_residual_cost(edge, 0.0);
                self.saturated[edge] = true;
            } else {
                self.saturated[edge] = false;
            }
        }
    }

    fn create_new_cable_type_while_canceling(
        &mut self,
        farm: &Windfarm,
        edge: EdgeId,
        delta: i32,
    ) {
        if !self.saturated[edge] {
            return;
        }
        debug_assert!(!farm.is_super_substation(farm.start_vertex(edge)));
        debug_assert!(!farm.is_super_substation(farm.end_vertex(edge)));

        let mut new_costs = farm.cables().expanded_costs().to_vec();
        let mid = new_costs.len() / 2;
        let previous_flow = farm.flow(farm.reverse_edge(edge));
        let previous_cost = new_costs[(mid as i32 + previous_flow) as usize];
        let new_flow = previous_flow - delta;
        let new_cost = new_costs[(mid as i32 + new_flow) as usize];
        // Shift every band below the previous flow so that the upgrade the
        // cycle just used stays free from now on.
        for k in (0..(mid as i32 + previous_flow) as usize).rev() {
            if new_costs[k] != previous_cost {
                new_costs[k] = new_costs[k] - new_cost + previous_cost;
            }
        }
        self.in_construction.add_edge(farm.reverse_edge(edge), new_costs.clone());

        let mut reversed = new_costs;
        reversed.reverse();
        self.in_construction.add_edge(edge, reversed);
        debug!("FREECABLE\tADAPT\t{}\t{}", edge, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks;

    #[test]
    fn residual_costs_on_a_routed_link() {
        let mut farm = mocks::single_link_farm();
        mocks::route_unit(&mut farm, &[0]);
        StandardCosts.compute_residual_costs(&mut farm, 1);

        // one more unit still fits in the cheapest cable
        assert_eq!(farm.residual_cost(0), 0.0);
        // taking the unit away refunds the whole cable
        assert_eq!(farm.residual_cost(farm.reverse_edge(0)), -200.0);
        // drain towards the super substation is free while capacity lasts
        let drain = farm.edge_to_super(1);
        assert_eq!(farm.residual_cost(drain), 0.0);
        assert_eq!(farm.residual_cost(farm.reverse_edge(drain)), 0.0);
    }

    #[test]
    fn capacity_violations_cost_infinity() {
        let mut farm = mocks::single_link_farm();
        mocks::route_unit(&mut farm, &[0]);

        // a delta larger than the remaining cable capacity
        StandardCosts.compute_residual_costs(&mut farm, 15);
        assert!(farm.residual_cost(0).is_infinite());
        // more than the substation has left
        let drain = farm.edge_to_super(1);
        StandardCosts.compute_residual_costs(&mut farm, 5);
        assert!(farm.residual_cost(drain).is_infinite());
        // taking away more than arrives
        StandardCosts.compute_residual_costs(&mut farm, 2);
        assert!(farm.residual_cost(farm.reverse_edge(0)).is_infinite());
    }

    #[test]
    fn crossing_a_cable_breakpoint_costs_the_difference() {
        let mut farm = mocks::single_link_farm();
        farm.set_flow(0, 5);
        farm.set_flow(farm.edge_to_super(1), 5);
        StandardCosts.compute_residual_costs(&mut farm, 1);
        // 5 -> 6 crosses from the 20-cable into the 25-cable
        assert_eq!(farm.residual_cost(0), (25 - 20) as f64 * 10.0);
    }

    #[test]
    fn free_cables_zero_saturated_edges() {
        let mut farm = mocks::single_link_farm();
        farm.set_flow(0, 5);
        farm.set_flow(farm.edge_to_super(1), 5);
        let mut computer = FreeSatisfiedCosts::new(&farm);
        computer.compute_residual_costs(&mut farm, 1);
        assert_eq!(farm.residual_cost(0), 0.0);
        assert!(computer.saturated[0]);
        assert!(!computer.saturated[farm.reverse_edge(0)]);
    }

    #[test]
    fn free_cable_override_construction() {
        let mut farm = mocks::single_link_farm();
        farm.set_flow(0, 5);
        farm.set_flow(farm.edge_to_super(1), 5);
        let mut computer = FreeSatisfiedCosts::new(&farm);
        computer.compute_residual_costs(&mut farm, 1);
        computer.create_new_cable_type_while_canceling(&farm, 0, 1);

        let overrides = computer.overrides_in_construction();
        assert_eq!(overrides.entries().len(), 2);
        assert_eq!(overrides.entries()[0].edge, farm.reverse_edge(0));
        assert_eq!(overrides.entries()[1].edge, 0);
        // the band the upgrade runs into now continues at the old price
        let adapted = overrides.entries()[0].cables.expanded_costs();
        let mid = adapted.len() / 2;
        assert_eq!(adapted[mid - 5], 20);
        assert_eq!(adapted[mid - 6], 20);
    }

    #[test]
    fn stolen_overrides_survive_in_the_adapted_computer() {
        let mut farm = mocks::single_link_farm();
        farm.set_flow(0, 5);
        farm.set_flow(farm.edge_to_super(1), 5);
        let mut free = FreeSatisfiedCosts::new(&farm);
        free.compute_residual_costs(&mut farm, 1);
        free.create_new_cable_type_while_canceling(&farm, 0, 1);

        let mut adapted = AdaptedCosts::new();
        adapted.steal_from(&mut free);
        assert!(free.overrides_in_construction().is_empty());
        assert_eq!(adapted.overrides().entries().len(), 2);

        // with the override in place, the upgrade on edge 0 stays free
        farm.add_flow(0, 1);
        farm.add_flow(farm.edge_to_super(1), 1);
        adapted.compute_residual_costs(&mut farm, 1);
        assert!(farm.residual_cost(0) <= 0.0);
    }
}
