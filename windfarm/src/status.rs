//! Return codes shared by initialization, detection, canceling and escaping.

use serde::{Deserialize, Serialize};

/// Outcome of an algorithm phase. The numeric codes end up in the summary
/// CSV, so they are part of the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,
    Infeasible,
    IterationLimit,
    TimeLimit,
    InProgress,
    NoFeasibleSolutionFound,
    EarlyTermination,
    BoundToTerminate,
    NothingChanged,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Infeasible => 3,
            Status::IterationLimit => 7,
            Status::TimeLimit => 9,
            Status::InProgress => 14,
            Status::NoFeasibleSolutionFound => 16,
            Status::EarlyTermination => 17,
            Status::BoundToTerminate => 18,
            Status::NothingChanged => 19,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::Infeasible.code(), 3);
        assert_eq!(Status::IterationLimit.code(), 7);
        assert_eq!(Status::TimeLimit.code(), 9);
        assert_eq!(Status::NoFeasibleSolutionFound.code(), 16);
        assert_eq!(Status::EarlyTermination.code(), 17);
        assert_eq!(Status::NothingChanged.code(), 19);
        assert_eq!(format!("{}", Status::TimeLimit), "9");
    }
}
