//! The cable cost model.
//!
//! A cable type is a (capacity, cost per unit length) pair. The whole
//! catalogue is kept in expanded form: a symmetric, odd-length vector that
//! maps a signed flow value to the cost of the cheapest cable carrying it.

use crate::FlowUnits;

/// Sentinel cost for flow that no cable can carry.
pub const INFINITE_COST: i32 = i32::MAX / 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CableError {
    /// Breakpoint vectors differ in length or are empty.
    MalformedBreakpoints,
    /// Capacities or costs are not strictly increasing.
    NotStrictlyIncreasing,
    /// Expanded vector has even length.
    EvenExpandedVector,
    /// Expanded vector is not non-decreasing away from the midpoint.
    NotMonotoneFromMidpoint,
}

impl std::fmt::Display for CableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CableError::MalformedBreakpoints => {
                write!(f, "capacity and cost vectors must be non-empty and of equal length")
            }
            CableError::NotStrictlyIncreasing => {
                write!(f, "capacities and costs must be strictly increasing")
            }
            CableError::EvenExpandedVector => {
                write!(f, "expanded cost vector must have odd length")
            }
            CableError::NotMonotoneFromMidpoint => {
                write!(f, "expanded cost vector must be non-decreasing away from its midpoint")
            }
        }
    }
}

impl std::error::Error for CableError {}

/// The cost function for flow on wind farm cables.
///
/// Either built from real cable types (capacity and cost breakpoints) or
/// from an arbitrary expanded vector. The latter may be asymmetric, in which
/// case no breakpoints are available and only the expanded form is usable.
#[derive(Debug, Clone)]
pub struct Cabletypes {
    capacities: Vec<i32>,
    costs: Vec<i32>,
    max_capacity: i32,
    expanded: Vec<i32>,
    from_real_cables: bool,
}

impl Cabletypes {
    /// Builds the table from breakpoint form. The i-th entries of the two
    /// vectors describe the i-th cable type.
    pub fn from_breakpoints(
        capacities: Vec<i32>,
        costs: Vec<i32>,
    ) -> Result<Cabletypes, CableError> {
        if capacities.is_empty() || capacities.len() != costs.len() {
            return Err(CableError::MalformedBreakpoints);
        }
        if !is_strictly_increasing(&capacities) || !is_strictly_increasing(&costs) {
            return Err(CableError::NotStrictlyIncreasing);
        }
        let max_capacity = *capacities.last().unwrap();
        let expanded = expand(&capacities, &costs, max_capacity);
        Ok(Cabletypes {
            capacities,
            costs,
            max_capacity,
            expanded,
            from_real_cables: true,
        })
    }

    /// Builds the table from an expanded vector mapping flow to cost per
    /// unit length. The vector must have odd length, its middle entry
    /// corresponds to zero flow.
    ///
    /// If the vector is symmetric with a zero midpoint, breakpoints are
    /// recovered so that [Cabletypes::capacity_breakpoints] works again.
    pub fn from_expanded(expanded: Vec<i32>) -> Result<Cabletypes, CableError> {
        if expanded.len() % 2 != 1 {
            return Err(CableError::EvenExpandedVector);
        }
        if !is_monotone_from_midpoint(&expanded) {
            return Err(CableError::NotMonotoneFromMidpoint);
        }
        let max_capacity = (expanded.len() / 2) as i32;
        let mid = expanded.len() / 2;
        let from_real_cables =
            max_capacity > 0 && expanded[mid] == 0 && is_symmetric(&expanded);
        let (capacities, costs) = if from_real_cables {
            extract_breakpoints(&expanded)
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(Cabletypes {
            capacities,
            costs,
            max_capacity,
            expanded,
            from_real_cables,
        })
    }

    pub fn num_cables(&self) -> usize {
        self.costs.len()
    }

    /// The largest flow any cable can carry.
    pub fn max_capacity(&self) -> i32 {
        self.max_capacity
    }

    /// Cost per unit length of carrying `flow` on a single edge.
    /// [INFINITE_COST] if the flow exceeds every cable.
    pub fn cost_of_flow(&self, flow: FlowUnits) -> i32 {
        if flow < -self.max_capacity || flow > self.max_capacity {
            return INFINITE_COST;
        }
        let mid = (self.expanded.len() / 2) as i32;
        self.expanded[(mid + flow) as usize]
    }

    pub fn expanded_costs(&self) -> &[i32] {
        &self.expanded
    }

    /// Capacity breakpoints of the underlying cable types.
    ///
    /// Only valid when the table was built from, or could be reduced to,
    /// real cable types.
    pub fn capacity_breakpoints(&self) -> &[i32] {
        assert!(self.from_real_cables, "cable table not given by real cables");
        &self.capacities
    }

    /// Cost breakpoints of the underlying cable types. Same restriction as
    /// [Cabletypes::capacity_breakpoints].
    pub fn cost_breakpoints(&self) -> &[i32] {
        assert!(self.from_real_cables, "cable table not given by real cables");
        &self.costs
    }
}

fn is_strictly_increasing(v: &[i32]) -> bool {
    v.windows(2).all(|w| w[0] < w[1])
}

fn is_symmetric(expanded: &[i32]) -> bool {
    let mid = expanded.len() / 2;
    (1..=mid).all(|k| expanded[mid + k] == expanded[mid - k])
}

fn is_monotone_from_midpoint(expanded: &[i32]) -> bool {
    let mid = expanded.len() / 2;
    (0..mid).all(|k| expanded[mid + k] <= expanded[mid + k + 1] && expanded[mid - k] <= expanded[mid - k - 1])
}

/// Expands breakpoints into the symmetric flow-to-cost vector of size
/// `2 * max_capacity + 1` with zero cost at the midpoint.
fn expand(capacities: &[i32], costs: &[i32], max_capacity: i32) -> Vec<i32> {
    let mid = max_capacity as usize;
    let mut expanded = vec![0; 2 * mid + 1];
    let mut step = 0;
    for k in 1..=mid {
        if k as i32 > capacities[step] {
            step += 1;
        }
        expanded[mid + k] = costs[step];
        expanded[mid - k] = costs[step];
    }
    expanded
}

/// Recovers breakpoints from a symmetric expanded vector. A breakpoint is
/// recorded at each flow value where the cost first changes.
fn extract_breakpoints(expanded: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let mid = expanded.len() / 2;
    let mut capacities = Vec::new();
    let mut costs = Vec::new();
    let mut previous = 0;
    for k in 1..=mid {
        let current = expanded[mid + k];
        if current != previous {
            capacities.push(k as i32);
            costs.push(current);
            previous = current;
        }
    }
    (capacities, costs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_cables() -> Cabletypes {
        Cabletypes::from_breakpoints(vec![5, 8, 12, 15], vec![20, 25, 27, 41]).unwrap()
    }

    #[test]
    fn expansion_of_default_table() {
        let cables = default_cables();
        assert_eq!(cables.max_capacity(), 15);
        assert_eq!(cables.num_cables(), 4);
        assert_eq!(cables.expanded_costs().len(), 31);
        assert_eq!(cables.cost_of_flow(0), 0);
        assert_eq!(cables.cost_of_flow(1), 20);
        assert_eq!(cables.cost_of_flow(5), 20);
        assert_eq!(cables.cost_of_flow(6), 25);
        assert_eq!(cables.cost_of_flow(-6), 25);
        assert_eq!(cables.cost_of_flow(9), 27);
        assert_eq!(cables.cost_of_flow(13), 41);
        assert_eq!(cables.cost_of_flow(15), 41);
        assert_eq!(cables.cost_of_flow(16), INFINITE_COST);
        assert_eq!(cables.cost_of_flow(-16), INFINITE_COST);
    }

    #[test]
    fn expanded_vector_is_symmetric() {
        let cables = default_cables();
        let expanded = cables.expanded_costs();
        let mid = expanded.len() / 2;
        for k in 1..=mid {
            assert_eq!(expanded[mid + k], expanded[mid - k]);
        }
        assert_eq!(expanded[mid], 0);
    }

    #[test]
    fn breakpoints_recovered_at_cost_changes() {
        let cables = default_cables();
        let recovered = Cabletypes::from_expanded(cables.expanded_costs().to_vec()).unwrap();
        // Recovered capacities mark the first flow value of each cost band.
        assert_eq!(recovered.capacity_breakpoints(), &[1, 6, 9, 13]);
        assert_eq!(recovered.cost_breakpoints(), &[20, 25, 27, 41]);
        assert_eq!(recovered.max_capacity(), 15);
        assert_eq!(recovered.expanded_costs(), cables.expanded_costs());
    }

    #[test]
    fn rejects_bad_breakpoints() {
        assert!(Cabletypes::from_breakpoints(vec![5, 5], vec![1, 2]).is_err());
        assert!(Cabletypes::from_breakpoints(vec![5, 8], vec![2, 2]).is_err());
        assert!(Cabletypes::from_breakpoints(vec![5], vec![1, 2]).is_err());
        assert!(Cabletypes::from_breakpoints(vec![], vec![]).is_err());
    }

    #[test]
    fn rejects_bad_expanded_vectors() {
        assert!(Cabletypes::from_expanded(vec![1, 0, 0, 1]).is_err());
        assert!(Cabletypes::from_expanded(vec![2, 1, 0, 1, 1, 3, 2]).is_err());
    }

    #[test]
    fn asymmetric_expanded_vector_has_no_breakpoints() {
        let cables = Cabletypes::from_expanded(vec![3, 1, 0, 2, 2]).unwrap();
        assert_eq!(cables.max_capacity(), 2);
        assert_eq!(cables.cost_of_flow(-2), 3);
        assert_eq!(cables.cost_of_flow(2), 2);
        assert_eq!(cables.num_cables(), 0);
    }
}
