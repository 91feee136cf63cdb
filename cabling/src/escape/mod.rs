//! Local-minimum escaping on top of negative-cycle canceling.
//!
//! The escaping driver alternates NCC sweeps with randomly drawn escaping
//! strategies. Each strategy perturbs the flow or the residual costs just
//! enough to give the next sweep something to cancel; the driver keeps the
//! best flow seen and enforces that no strategy is retried within one
//! unchanged iteration block.

mod bonbons;
mod free_cables;
mod leaves;

pub use bonbons::BonbonsEscape;
pub use free_cables::FreeCablesEscape;
pub use leaves::LeavesEscape;

use crate::init::InitializationStrategy;
use crate::ncc::NegativeCycleCanceling;
use crate::report::NccLogger;
use crate::residual::AdaptedCosts;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use windfarm::{assert_feasible_flow, FlowUnits, Status, Windfarm};

/// One escaping strategy with its private state.
pub enum EscapeStrategy {
    /// Throws the flow away and re-runs the initialization.
    NewInit { calls: u32 },
    Leaves(LeavesEscape),
    Bonbons(BonbonsEscape),
    FreeCables(FreeCablesEscape),
}

impl EscapeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            EscapeStrategy::NewInit { .. } => "NewInit",
            EscapeStrategy::Leaves(_) => "Leaves",
            EscapeStrategy::Bonbons(_) => "Bonbon",
            EscapeStrategy::FreeCables(_) => "FreeCables",
        }
    }

    fn apply(
        &mut self,
        farm: &mut Windfarm,
        core: &mut NegativeCycleCanceling,
        costs: &mut AdaptedCosts,
    ) -> Status {
        debug!("ESCAPE\tTRY\t{}", self.name());
        match self {
            EscapeStrategy::NewInit { calls } => {
                *calls += 1;
                apply_new_initialization(farm, core, *calls)
            }
            EscapeStrategy::Leaves(state) => {
                state.calls += 1;
                state.apply(farm, costs)
            }
            EscapeStrategy::Bonbons(state) => {
                state.calls += 1;
                state.apply(farm, core, costs)
            }
            EscapeStrategy::FreeCables(state) => {
                state.calls += 1;
                state.apply(farm, core, costs)
            }
        }
    }
}

/// Zeroes the flow and re-runs the initialization strategy. From the third
/// call on, the per-turbine collected flags are reset as well, so a
/// collecting initialization starts from scratch.
fn apply_new_initialization(
    farm: &mut Windfarm,
    core: &mut NegativeCycleCanceling,
    calls: u32,
) -> Status {
    for edge in 0..farm.num_edges() {
        farm.set_flow(edge, 0);
    }
    if calls > 2 {
        for index in 0..farm.num_turbines() {
            let turbine = farm.turbines()[index];
            core.init.set_turbine_collected(turbine, false);
        }
    }
    let code = core.init.initialize_flow(farm);
    if code == Status::Success && cfg!(debug_assertions) {
        assert_feasible_flow(farm);
    }
    code
}

/// Stores the escaping strategies and draws them by weight.
pub struct StrategyKeeper {
    strategies: Vec<(EscapeStrategy, u32)>,
    iteration_of_last_use: Vec<usize>,
    iteration_of_last_change: usize,
    used_unsuccessfully: usize,
    current: usize,
    rng: Xoshiro256StarStar,
    distribution: Option<WeightedIndex<u32>>,
}

impl StrategyKeeper {
    pub fn new(seed: u64) -> StrategyKeeper {
        StrategyKeeper {
            strategies: Vec::new(),
            iteration_of_last_use: Vec::new(),
            iteration_of_last_change: 0,
            used_unsuccessfully: 0,
            current: usize::MAX,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            distribution: None,
        }
    }

    pub fn add_strategy(&mut self, strategy: EscapeStrategy, weight: u32) {
        debug_assert!(weight > 0);
        debug!("ESCAPE\tREGISTER\t{}\t{}", strategy.name(), weight);
        self.strategies.push((strategy, weight));
        self.iteration_of_last_use.push(0);
        let weights = self.strategies.iter().map(|(_, weight)| *weight);
        self.distribution = WeightedIndex::new(weights).ok();
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    fn draw_next(&mut self) {
        let distribution =
            self.distribution.as_ref().expect("draw_next requires registered strategies");
        self.current = distribution.sample(&mut self.rng);
    }

    fn current_name(&self) -> &'static str {
        self.strategies[self.current].0.name()
    }

    fn current_used_in_block(&self) -> bool {
        self.iteration_of_last_use[self.current] > self.iteration_of_last_change
    }

    fn mark_current_used_successfully(&mut self, iteration: usize) {
        self.iteration_of_last_use[self.current] = iteration;
        self.iteration_of_last_change = iteration;
        self.used_unsuccessfully = 0;
    }

    fn mark_current_used_unsuccessfully(&mut self, iteration: usize) {
        self.iteration_of_last_use[self.current] = iteration;
        self.used_unsuccessfully += 1;
    }

    fn all_used_in_block(&self) -> bool {
        self.used_unsuccessfully == self.strategies.len()
    }
}

/// NCC with escaping: repeatedly sweep all deltas, then apply escaping
/// strategies until one changes the flow, and go back to sweeping.
pub struct EscapingNcc {
    core: NegativeCycleCanceling,
    costs: AdaptedCosts,
    keeper: StrategyKeeper,
    iteration_limit: usize,
    best_flow: Vec<FlowUnits>,
    best_cost: f64,
    runs: usize,
}

impl EscapingNcc {
    /// Without any registered strategy the iteration limit collapses to 1,
    /// turning this into a single NCC run with snapshotting.
    pub fn new(
        farm: &Windfarm,
        core: NegativeCycleCanceling,
        keeper: StrategyKeeper,
        iteration_limit: Option<usize>,
    ) -> EscapingNcc {
        let iteration_limit =
            if keeper.is_empty() { 1 } else { iteration_limit.unwrap_or(usize::MAX) };
        EscapingNcc {
            core,
            costs: AdaptedCosts::new(),
            keeper,
            iteration_limit,
            best_flow: vec![0; farm.num_edges()],
            best_cost: f64::INFINITY,
            runs: 0,
        }
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn run(&mut self, farm: &mut Windfarm, logger: &mut dyn NccLogger) -> Status {
        let mut code = self.core.compute_initial_flow(farm, logger);
        if code == Status::Success && self.iteration_limit == 0 {
            code = Status::IterationLimit;
        }
        self.runs = 1;

        if code == Status::Success {
            code = self.alternate_ncc_and_escaping(farm, logger);
            if self.best_cost.is_finite() {
                self.copy_best_flow_to_farm(farm);
            }
        }
        logger.run_finished(self.core.timer.elapsed_ms(), farm.total_cost(), code);
        code
    }

    fn alternate_ncc_and_escaping(
        &mut self,
        farm: &mut Windfarm,
        logger: &mut dyn NccLogger,
    ) -> Status {
        let mut code = Status::InProgress;
        while code == Status::InProgress {
            debug!("ESCAPE\tITERATION\t{}", self.runs);
            self.core.bonbon = None;
            let ncc_status = self.core.run_all_deltas(farm, &mut self.costs, logger);

            // Escaping may have adapted residual costs, so the real cost of
            // the layout is recomputed from scratch.
            let real_cost = farm.total_cost();
            logger.half_iteration(
                "NCC",
                self.core.timer.elapsed_ms(),
                real_cost,
                real_cost - self.core.solution_cost,
                Status::Success,
            );
            self.save_best_flow_if_necessary(farm, real_cost);

            if ncc_status != Status::Success {
                return ncc_status;
            }
            code = self.try_escaping_strategies(farm, logger, real_cost);
        }
        code
    }

    /// Draws strategies until one succeeds (back to NCC), every strategy
    /// failed in this block, or a limit strikes.
    fn try_escaping_strategies(
        &mut self,
        farm: &mut Windfarm,
        logger: &mut dyn NccLogger,
        real_cost: f64,
    ) -> Status {
        loop {
            self.runs += 1;
            if self.core.time_limit_exceeded() {
                return Status::TimeLimit;
            }
            if self.runs > self.iteration_limit {
                return Status::IterationLimit;
            }

            self.keeper.draw_next();
            if self.keeper.current_used_in_block() {
                // Already tried since the flow last changed; draw again.
                logger.half_iteration(
                    self.keeper.current_name(),
                    self.core.timer.elapsed_ms(),
                    real_cost,
                    0.0,
                    Status::EarlyTermination,
                );
                continue;
            }

            let current = self.keeper.current;
            let status =
                self.keeper.strategies[current].0.apply(farm, &mut self.core, &mut self.costs);

            if status == Status::Success {
                let previous_cost = self.core.solution_cost;
                self.core.solution_cost = farm.total_cost();
                let new_cost = self.core.solution_cost;
                self.save_best_flow_if_necessary(farm, new_cost);
                self.keeper.mark_current_used_successfully(self.runs);
                logger.half_iteration(
                    self.keeper.current_name(),
                    self.core.timer.elapsed_ms(),
                    new_cost,
                    new_cost - previous_cost,
                    Status::Success,
                );
                debug!("ESCAPE\tSUCCESS\t{}", self.keeper.current_name());
                return Status::InProgress;
            }

            debug_assert_eq!(status, Status::NothingChanged);
            self.keeper.mark_current_used_unsuccessfully(self.runs);
            logger.half_iteration(
                self.keeper.current_name(),
                self.core.timer.elapsed_ms(),
                real_cost,
                0.0,
                Status::NothingChanged,
            );
            debug!("ESCAPE\tFAILED\t{}", self.keeper.current_name());
            if self.keeper.all_used_in_block() {
                return Status::EarlyTermination;
            }
        }
    }

    fn save_best_flow_if_necessary(&mut self, farm: &Windfarm, cost: f64) {
        if cost < self.best_cost {
            self.best_cost = cost;
            for edge in 0..farm.num_edges() {
                self.best_flow[edge] = farm.flow(edge);
            }
            debug!("ESCAPE\tBEST\t{}", cost);
        }
    }

    fn copy_best_flow_to_farm(&self, farm: &mut Windfarm) {
        debug_assert_eq!(self.best_flow.len(), farm.num_edges());
        for edge in 0..farm.num_edges() {
            farm.set_flow(edge, self.best_flow[edge]);
        }
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
    use crate::report::DummyLogger;
    use windfarm::COST_EPSILON;

    fn escaping_ncc(farm: &Windfarm, seed: u64, with_strategies: bool) -> EscapingNcc {
        let dijkstra = Dijkstra::new(farm, EdgeMetric::Euclidean);
        let init = NonCollecting::new(dijkstra, Target::AnyFreeSubstation);
        let core = NegativeCycleCanceling::new(
            farm,
            Box::new(init),
            Box::new(IncreasingDelta::new(2 * farm.cables().max_capacity())),
            Box::new(SideTripFreeBellmanFord::new(farm)),
            f64::INFINITY,
        );
        let mut keeper = StrategyKeeper::new(seed);
        if with_strategies {
            keeper.add_strategy(EscapeStrategy::Leaves(LeavesEscape::new(farm)), 1);
            keeper.add_strategy(EscapeStrategy::Bonbons(BonbonsEscape::new(farm)), 1);
            keeper.add_strategy(EscapeStrategy::FreeCables(FreeCablesEscape::new(farm)), 1);
        }
        EscapingNcc::new(farm, core, keeper, Some(50))
    }

    #[test]
    fn without_strategies_it_degenerates_to_one_ncc_run() {
        let mut farm = mocks::triangle_farm();
        let mut ncc = escaping_ncc(&farm, 0, false);
        let code = ncc.run(&mut farm, &mut DummyLogger);
        // One iteration, then the iteration limit strikes.
        assert_eq!(code, Status::IterationLimit);
        assert_feasible_flow(&farm);
        assert!((ncc.best_cost() - farm.total_cost()).abs() < COST_EPSILON);
    }

    #[test]
    fn escaping_run_is_deterministic_per_seed() {
        let mut farm_a = mocks::two_substation_farm();
        let mut ncc_a = escaping_ncc(&farm_a, 11, true);
        let code_a = ncc_a.run(&mut farm_a, &mut DummyLogger);

        let mut farm_b = mocks::two_substation_farm();
        let mut ncc_b = escaping_ncc(&farm_b, 11, true);
        let code_b = ncc_b.run(&mut farm_b, &mut DummyLogger);

        assert_eq!(code_a, code_b);
        assert_eq!(ncc_a.best_cost(), ncc_b.best_cost());
        for edge in 0..farm_a.num_edges() {
            assert_eq!(farm_a.flow(edge), farm_b.flow(edge));
        }
    }

    #[test]
    fn best_flow_is_restored_after_termination() {
        let mut farm = mocks::leaf_farm();
        let mut ncc = escaping_ncc(&farm, 5, true);
        let code = ncc.run(&mut farm, &mut DummyLogger);
        assert!(matches!(
            code,
            Status::EarlyTermination | Status::IterationLimit
        ));
        assert_feasible_flow(&farm);
        assert!((ncc.best_cost() - farm.total_cost()).abs() < COST_EPSILON);
        // best-so-far never worse than the plain initialization
        assert!(ncc.best_cost() <= 120.0 + COST_EPSILON);
    }
}
