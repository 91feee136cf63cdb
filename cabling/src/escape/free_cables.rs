//! The free-cables escape: one canceling pass at delta 1 in which every
//! saturated edge may upgrade its cable for free. Upgrades that a canceled
//! cycle actually used are turned into cost overrides and handed to the
//! outer driver, so later sweeps keep treating them as free.

use crate::ncc::NegativeCycleCanceling;
use crate::report::DummyLogger;
use crate::residual::{AdaptedCosts, FreeSatisfiedCosts};
use windfarm::{Status, Windfarm};

pub struct FreeCablesEscape {
    pub(crate) calls: u32,
    costs: FreeSatisfiedCosts,
}

impl FreeCablesEscape {
    pub fn new(farm: &Windfarm) -> FreeCablesEscape {
        FreeCablesEscape { calls: 0, costs: FreeSatisfiedCosts::new(farm) }
    }

    pub(crate) fn apply(
        &mut self,
        farm: &mut Windfarm,
        core: &mut NegativeCycleCanceling,
        outer_costs: &mut AdaptedCosts,
    ) -> Status {
        // The pass below prices saturated edges at zero; whatever override
        // tables it constructs are carried over to the next regular sweeps.
        let code = core.single_delta_pass(farm, &mut self.costs, 1, &mut DummyLogger, false);
        outer_costs.steal_from(&mut self.costs);
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bellman_ford::SideTripFreeBellmanFord;
    use crate::delta::IncreasingDelta;
    use crate::dijkstra::{Dijkstra, EdgeMetric, Target};
    use crate::init::NonCollecting;
    use crate::mocks;
    use windfarm::assert_feasible_flow;

    fn core(farm: &Windfarm) -> NegativeCycleCanceling {
        let dijkstra = Dijkstra::new(farm, EdgeMetric::Euclidean);
        let init = NonCollecting::new(dijkstra, Target::AnyFreeSubstation);
        NegativeCycleCanceling::new(
            farm,
            Box::new(init),
            Box::new(IncreasingDelta::new(2 * farm.cables().max_capacity())),
            Box::new(SideTripFreeBellmanFord::new(farm)),
            f64::INFINITY,
        )
    }

    #[test]
    fn pass_without_saturated_edges_changes_nothing() {
        let mut farm = mocks::triangle_farm();
        mocks::route_unit(&mut farm, &[0]);
        mocks::route_unit(&mut farm, &[1]);
        let mut core = core(&farm);
        let mut outer = AdaptedCosts::new();
        let mut escape = FreeCablesEscape::new(&farm);
        let status = escape.apply(&mut farm, &mut core, &mut outer);
        assert!(matches!(status, Status::NothingChanged | Status::Success));
        assert_feasible_flow(&farm);
        // nothing was saturated, so no overrides were constructed
        assert!(escape.costs.overrides_in_construction().is_empty());
    }

    #[test]
    fn overrides_end_up_with_the_outer_computer() {
        // Route every chain turbine through the chain; the second-to-last
        // edge carries five units and sits exactly at the first breakpoint.
        let mut farm = mocks::chain_farm();
        for start in 0..6 {
            let walk: Vec<_> = (start..6).collect();
            mocks::route_unit(&mut farm, &walk);
        }
        assert_feasible_flow(&farm);
        assert_eq!(farm.flow(4), 5);
        assert_eq!(farm.flow(5), 6);

        let mut core = core(&farm);
        let mut outer = AdaptedCosts::new();
        let mut escape = FreeCablesEscape::new(&farm);
        let status = escape.apply(&mut farm, &mut core, &mut outer);
        assert_feasible_flow(&farm);
        // Whether or not a cycle cancels here, the in-construction list is
        // always moved out of the strategy.
        assert!(escape.costs.overrides_in_construction().is_empty());
        if status == Status::Success {
            assert!(!outer.overrides().is_empty());
        }
    }
}
