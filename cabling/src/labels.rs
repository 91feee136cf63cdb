//! Distance labels for negative-cycle detection.
//!
//! A label stores the tentative distance(s) of one vertex together with the
//! incoming edge(s) they were computed over. The two implementations give
//! the two flavours of Bellman-Ford:
//! - [OneDistanceLabel]: textbook labels,
//! - [TwoDistancesLabel]: the two best distances via different parent
//!   edges, which lets the search forbid an immediate back-and-forth step
//!   ("side trip") and thereby find cycles longer than 2.

use windfarm::{EdgeId, Windfarm};

/// Capability set a label must offer to [crate::bellman_ford::BellmanFord].
pub trait DistanceLabel: Clone + Default {
    /// Whether proposing `distance` via `parent` would improve the label.
    /// Must not mutate.
    fn would_update(&self, distance: f64, parent: EdgeId) -> bool;

    /// Performs the improvement if possible; returns whether the label
    /// changed.
    fn update(&mut self, distance: f64, parent: EdgeId) -> bool;

    /// The distance to use when leaving the vertex over `outgoing`.
    fn distance(&self, farm: &Windfarm, outgoing: EdgeId) -> f64;

    /// The parent edge paired with [DistanceLabel::distance].
    fn parent(&self, farm: &Windfarm, outgoing: EdgeId) -> Option<EdgeId>;

    /// Number of Bellman-Ford rounds this label type needs.
    fn rounds(num_vertices: usize) -> usize;
}

/// One tentative distance with its parent edge.
#[derive(Debug, Clone)]
pub struct OneDistanceLabel {
    dist: f64,
    parent: Option<EdgeId>,
}

impl Default for OneDistanceLabel {
    fn default() -> OneDistanceLabel {
        OneDistanceLabel { dist: f64::INFINITY, parent: None }
    }
}

impl DistanceLabel for OneDistanceLabel {
    fn would_update(&self, distance: f64, _parent: EdgeId) -> bool {
        distance < self.dist
    }

    fn update(&mut self, distance: f64, parent: EdgeId) -> bool {
        if distance < self.dist {
            self.dist = distance;
            self.parent = Some(parent);
            true
        } else {
            false
        }
    }

    fn distance(&self, _farm: &Windfarm, _outgoing: EdgeId) -> f64 {
        self.dist
    }

    fn parent(&self, _farm: &Windfarm, _outgoing: EdgeId) -> Option<EdgeId> {
        self.parent
    }

    fn rounds(num_vertices: usize) -> usize {
        num_vertices - 1
    }
}

/// The two smallest tentative distances computed via two different parent
/// edges, ordered so that `dist <= dist_second`.
#[derive(Debug, Clone)]
pub struct TwoDistancesLabel {
    dist: f64,
    parent: Option<EdgeId>,
    dist_second: f64,
    parent_second: Option<EdgeId>,
}

impl Default for TwoDistancesLabel {
    fn default() -> TwoDistancesLabel {
        TwoDistancesLabel {
            dist: f64::INFINITY,
            parent: None,
            dist_second: f64::INFINITY,
            parent_second: None,
        }
    }
}

impl TwoDistancesLabel {
    /// The distance when the last step must not be `forbidden_parent`.
    pub fn distance_forbidding(&self, forbidden_parent: EdgeId) -> f64 {
        if self.parent == Some(forbidden_parent) {
            self.dist_second
        } else {
            self.dist
        }
    }

    /// The parent when the last step must not be `forbidden_parent`.
    pub fn parent_forbidding(&self, forbidden_parent: EdgeId) -> Option<EdgeId> {
        if self.parent == Some(forbidden_parent) {
            self.parent_second
        } else {
            self.parent
        }
    }
}

impl DistanceLabel for TwoDistancesLabel {
    fn would_update(&self, distance: f64, parent: EdgeId) -> bool {
        distance < self.dist || (distance < self.dist_second && self.parent != Some(parent))
    }

    /// After the update the label contains the two smallest of the three
    /// candidate distances such that their parent edges differ.
    fn update(&mut self, distance: f64, parent: EdgeId) -> bool {
        if distance < self.dist {
            if self.parent == Some(parent) {
                self.dist = distance;
            } else {
                self.dist_second = self.dist;
                self.parent_second = self.parent;
                self.dist = distance;
                self.parent = Some(parent);
            }
            true
        } else if distance < self.dist_second && self.parent != Some(parent) {
            self.dist_second = distance;
            self.parent_second = Some(parent);
            true
        } else {
            false
        }
    }

    /// Leaving over `outgoing` forbids arriving over its reverse edge.
    fn distance(&self, farm: &Windfarm, outgoing: EdgeId) -> f64 {
        self.distance_forbidding(farm.reverse_edge(outgoing))
    }

    fn parent(&self, farm: &Windfarm, outgoing: EdgeId) -> Option<EdgeId> {
        self.parent_forbidding(farm.reverse_edge(outgoing))
    }

    fn rounds(num_vertices: usize) -> usize {
        2 * num_vertices - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_distance_keeps_minimum() {
        let mut label = OneDistanceLabel::default();
        assert!(label.would_update(5.0, 0));
        assert!(label.update(5.0, 0));
        assert!(!label.update(5.0, 1));
        assert!(label.update(3.0, 1));
        assert_eq!(label.parent, Some(1));
        assert_eq!(label.dist, 3.0);
    }

    #[test]
    fn two_distances_require_distinct_parents() {
        let mut label = TwoDistancesLabel::default();
        assert!(label.update(5.0, 0));
        // same parent only overwrites the first slot
        assert!(label.update(4.0, 0));
        assert_eq!(label.dist, 4.0);
        assert_eq!(label.dist_second, f64::INFINITY);
        // different parent shifts the old first distance down
        assert!(label.update(3.0, 1));
        assert_eq!(label.dist, 3.0);
        assert_eq!(label.parent, Some(1));
        assert_eq!(label.dist_second, 4.0);
        assert_eq!(label.parent_second, Some(0));
        // a second-slot candidate with the first parent is rejected
        assert!(!label.update(3.5, 1));
        assert!(label.update(3.5, 2));
        assert_eq!(label.dist_second, 3.5);
        assert_eq!(label.parent_second, Some(2));
    }

    #[test]
    fn forbidding_switches_to_second_pair() {
        let mut label = TwoDistancesLabel::default();
        label.update(1.0, 7);
        label.update(2.0, 8);
        assert_eq!(label.distance_forbidding(7), 2.0);
        assert_eq!(label.parent_forbidding(7), Some(8));
        assert_eq!(label.distance_forbidding(9), 1.0);
        assert_eq!(label.parent_forbidding(9), Some(7));
    }

    #[test]
    fn round_counts() {
        assert_eq!(OneDistanceLabel::rounds(10), 9);
        assert_eq!(TwoDistancesLabel::rounds(10), 19);
    }
}
