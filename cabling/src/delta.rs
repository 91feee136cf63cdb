//! Strategies that decide which flow change (delta) the next
//! negative-cycle search tries. The highest delta is twice the largest
//! cable capacity, so that a full cable can be turned around in one move.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

pub trait DeltaStrategy {
    /// The delta for the first canceling iteration.
    fn first_delta(&mut self) -> i32;

    /// The next delta, given the one just tried and whether it canceled a
    /// cycle. May return a non-positive value once all deltas are spent.
    fn next_delta(&mut self, current_delta: i32, canceled_negative_cycle: bool) -> i32;

    /// Whether another iteration with `upcoming_delta` should run.
    fn should_continue(&mut self, upcoming_delta: i32) -> bool;

    fn max_flow_change(&self) -> i32;
}

/// Counts upward, restarting at 1 after every cancellation.
pub struct IncreasingDelta {
    max_flow_change: i32,
}

impl IncreasingDelta {
    pub fn new(max_flow_change: i32) -> IncreasingDelta {
        IncreasingDelta { max_flow_change }
    }
}

impl DeltaStrategy for IncreasingDelta {
    fn first_delta(&mut self) -> i32 {
        1
    }

    fn next_delta(&mut self, current_delta: i32, canceled_negative_cycle: bool) -> i32 {
        if canceled_negative_cycle {
            1
        } else {
            current_delta + 1
        }
    }

    fn should_continue(&mut self, upcoming_delta: i32) -> bool {
        upcoming_delta <= self.max_flow_change
    }

    fn max_flow_change(&self) -> i32 {
        self.max_flow_change
    }
}

/// Counts downward, restarting at the maximum after every cancellation.
pub struct DecreasingDelta {
    max_flow_change: i32,
}

impl DecreasingDelta {
    pub fn new(max_flow_change: i32) -> DecreasingDelta {
        DecreasingDelta { max_flow_change }
    }
}

impl DeltaStrategy for DecreasingDelta {
    fn first_delta(&mut self) -> i32 {
        self.max_flow_change
    }

    fn next_delta(&mut self, current_delta: i32, canceled_negative_cycle: bool) -> i32 {
        if canceled_negative_cycle {
            self.max_flow_change
        } else {
            current_delta - 1
        }
    }

    fn should_continue(&mut self, upcoming_delta: i32) -> bool {
        upcoming_delta > 0
    }

    fn max_flow_change(&self) -> i32 {
        self.max_flow_change
    }
}

/// Climbs until a cycle cancels, then descends from that delta; once 1 is
/// reached while descending, jumps back to the last successful delta and
/// climbs again.
pub struct IncreasingDecreasingDelta {
    max_flow_change: i32,
    last_delta_with_change: i32,
    increasing: bool,
}

impl IncreasingDecreasingDelta {
    pub fn new(max_flow_change: i32) -> IncreasingDecreasingDelta {
        IncreasingDecreasingDelta {
            max_flow_change,
            last_delta_with_change: 1,
            increasing: true,
        }
    }
}

impl DeltaStrategy for IncreasingDecreasingDelta {
    fn first_delta(&mut self) -> i32 {
        1
    }

    fn next_delta(&mut self, current_delta: i32, canceled_negative_cycle: bool) -> i32 {
        if canceled_negative_cycle {
            self.last_delta_with_change = current_delta;
            self.increasing = false;
        }
        if current_delta == 1 && !self.increasing {
            self.increasing = true;
            return self.last_delta_with_change;
        }
        if self.increasing {
            current_delta + 1
        } else {
            current_delta - 1
        }
    }

    fn should_continue(&mut self, upcoming_delta: i32) -> bool {
        upcoming_delta <= self.max_flow_change
    }

    fn max_flow_change(&self) -> i32 {
        self.max_flow_change
    }
}

/// Draws deltas uniformly without replacement from `1..=max`; a
/// cancellation reshuffles and starts the permutation over.
pub struct RandomDelta {
    deltas: Vec<i32>,
    deltas_since_update: usize,
    rng: Xoshiro256StarStar,
}

impl RandomDelta {
    pub fn new(max_flow_change: i32, seed: u64) -> RandomDelta {
        RandomDelta {
            deltas: (1..=max_flow_change).collect(),
            deltas_since_update: 0,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    // Deliberately allows one step past the end of the permutation; the
    // counter value is part of the loop protocol with should_continue.
    fn keep_drawing(&self) -> bool {
        self.deltas_since_update <= self.deltas.len()
    }
}

impl DeltaStrategy for RandomDelta {
    fn first_delta(&mut self) -> i32 {
        debug_assert_eq!(self.deltas_since_update, 0);
        self.deltas.shuffle(&mut self.rng);
        self.deltas_since_update += 1;
        self.deltas[0]
    }

    fn next_delta(&mut self, _current_delta: i32, canceled_negative_cycle: bool) -> i32 {
        if canceled_negative_cycle {
            self.deltas.shuffle(&mut self.rng);
            self.deltas_since_update = 1;
            return self.deltas[0];
        }
        if self.keep_drawing() {
            let delta = self.deltas.get(self.deltas_since_update).copied().unwrap_or(-1);
            self.deltas_since_update += 1;
            delta
        } else {
            -1
        }
    }

    fn should_continue(&mut self, _upcoming_delta: i32) -> bool {
        self.keep_drawing()
    }

    fn max_flow_change(&self) -> i32 {
        self.deltas.len() as i32
    }
}

/// Wrapper that repeats a successful delta until it stops canceling, then
/// advances the wrapped strategy while skipping that delta once.
pub struct SameNextDelta {
    inner: Box<dyn DeltaStrategy>,
    last_canceled: bool,
    last_canceled_delta: i32,
}

impl SameNextDelta {
    pub fn new(inner: Box<dyn DeltaStrategy>) -> SameNextDelta {
        SameNextDelta { inner, last_canceled: false, last_canceled_delta: 0 }
    }
}

impl DeltaStrategy for SameNextDelta {
    fn first_delta(&mut self) -> i32 {
        self.inner.first_delta()
    }

    fn next_delta(&mut self, current_delta: i32, canceled_negative_cycle: bool) -> i32 {
        if canceled_negative_cycle {
            self.last_canceled = true;
            self.last_canceled_delta = current_delta;
            return current_delta;
        }
        let upcoming = if self.last_canceled {
            self.last_canceled = false;
            self.inner.next_delta(current_delta, true)
        } else {
            self.inner.next_delta(current_delta, false)
        };
        if upcoming == self.last_canceled_delta {
            self.inner.next_delta(upcoming, false)
        } else {
            upcoming
        }
    }

    fn should_continue(&mut self, upcoming_delta: i32) -> bool {
        self.inner.should_continue(upcoming_delta)
    }

    fn max_flow_change(&self) -> i32 {
        self.inner.max_flow_change()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increasing_resets_on_cancellation() {
        let mut delta = IncreasingDelta::new(4);
        assert_eq!(delta.first_delta(), 1);
        assert_eq!(delta.next_delta(1, false), 2);
        assert_eq!(delta.next_delta(2, true), 1);
        assert!(delta.should_continue(4));
        assert!(!delta.should_continue(5));
    }

    #[test]
    fn decreasing_resets_to_max() {
        let mut delta = DecreasingDelta::new(4);
        assert_eq!(delta.first_delta(), 4);
        assert_eq!(delta.next_delta(4, false), 3);
        assert_eq!(delta.next_delta(3, true), 4);
        assert!(delta.should_continue(1));
        assert!(!delta.should_continue(0));
    }

    #[test]
    fn increasing_decreasing_bounces_off_one() {
        let mut delta = IncreasingDecreasingDelta::new(10);
        assert_eq!(delta.first_delta(), 1);
        assert_eq!(delta.next_delta(1, false), 2);
        assert_eq!(delta.next_delta(2, false), 3);
        // cancellation at 3 switches to descending
        assert_eq!(delta.next_delta(3, true), 2);
        assert_eq!(delta.next_delta(2, false), 1);
        // descending past 1 jumps back to the remembered delta
        assert_eq!(delta.next_delta(1, false), 3);
        assert_eq!(delta.next_delta(3, false), 4);
    }

    #[test]
    fn random_draws_every_delta_before_giving_up() {
        let mut delta = RandomDelta::new(6, 42);
        let mut seen = vec![delta.first_delta()];
        loop {
            let next = delta.next_delta(*seen.last().unwrap(), false);
            if !delta.should_continue(next) {
                break;
            }
            seen.push(next);
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn random_is_deterministic_per_seed() {
        let mut a = RandomDelta::new(8, 7);
        let mut b = RandomDelta::new(8, 7);
        assert_eq!(a.first_delta(), b.first_delta());
        for _ in 0..8 {
            assert_eq!(a.next_delta(1, false), b.next_delta(1, false));
        }
    }

    #[test]
    fn random_reshuffles_after_cancellation() {
        let mut delta = RandomDelta::new(5, 3);
        delta.first_delta();
        delta.next_delta(1, false);
        let restart = delta.next_delta(1, true);
        assert!((1..=5).contains(&restart));
        // the full permutation is available again
        let mut count = 1;
        let mut current = restart;
        loop {
            current = delta.next_delta(current, false);
            if !delta.should_continue(current) {
                break;
            }
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn stay_repeats_successful_delta_and_skips_it_afterwards() {
        let mut delta = SameNextDelta::new(Box::new(IncreasingDelta::new(10)));
        assert_eq!(delta.first_delta(), 1);
        assert_eq!(delta.next_delta(1, false), 2);
        // cancellation at 2: stay at 2
        assert_eq!(delta.next_delta(2, true), 2);
        assert_eq!(delta.next_delta(2, true), 2);
        // once 2 stops canceling, the inner strategy restarts at 1
        assert_eq!(delta.next_delta(2, false), 1);
        // and counting up skips the delta that was just exhausted
        assert_eq!(delta.next_delta(1, false), 3);
    }
}
