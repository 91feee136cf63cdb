//! Cabling -- negative-cycle-canceling algorithms for wind farm cable
//! layouts.
//!
//! The crate contains the full solver stack:
//! - shortest-path initialization ([dijkstra], [init]),
//! - negative-walk detection ([labels], [bellman_ford]),
//! - residual costs parametric in the tried flow change ([residual]),
//! - the delta sweep strategies ([delta]),
//! - the canceling driver ([ncc]) and the escaping driver ([escape]),
//! - run bookkeeping ([report]) and mock networks for tests ([mocks]).

#[macro_use]
extern crate log;

pub mod bellman_ford;
pub mod delta;
pub mod dijkstra;
pub mod escape;
pub mod init;
pub mod labels;
pub mod mocks;
pub mod ncc;
pub mod report;
pub mod residual;
pub mod timer;

pub use bellman_ford::{BellmanFord, CycleDetection, SideTripFreeBellmanFord, StandardBellmanFord};
pub use delta::{
    DecreasingDelta, DeltaStrategy, IncreasingDecreasingDelta, IncreasingDelta, RandomDelta,
    SameNextDelta,
};
pub use dijkstra::{Dijkstra, EdgeMetric, Target};
pub use escape::{
    BonbonsEscape, EscapeStrategy, EscapingNcc, FreeCablesEscape, LeavesEscape, StrategyKeeper,
};
pub use init::{Collecting, InitializationStrategy, NonCollecting};
pub use labels::{DistanceLabel, OneDistanceLabel, TwoDistancesLabel};
pub use ncc::{NegativeCycleCanceling, SingleRunNcc};
pub use report::{DummyLogger, NccLogger, RunLogger, RuntimeRow, SummaryRow};
pub use residual::{AdaptedCosts, FreeSatisfiedCosts, ResidualCostComputer, StandardCosts};
pub use timer::Timer;
