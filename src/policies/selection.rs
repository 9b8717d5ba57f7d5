//! # Instance selection for the delivery pool.
//!
//! [`SelectionPolicy`] decides which delivery manager receives the next
//! delivery when the caller does not name one.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// Policy for spreading deliveries over pool instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Cycle through instances in name order (default).
    #[default]
    RoundRobin,
    /// Uniformly random instance per delivery.
    Random,
}

impl SelectionPolicy {
    /// Picks an index in `0..len`. `cursor` is the shared round-robin state.
    ///
    /// Returns `None` when `len == 0`.
    pub fn pick(&self, cursor: &AtomicUsize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let idx = match self {
            SelectionPolicy::RoundRobin => cursor.fetch_add(1, Ordering::Relaxed) % len,
            SelectionPolicy::Random => rand::rng().random_range(0..len),
        };
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_evenly() {
        let cursor = AtomicUsize::new(0);
        let picks: Vec<usize> = (0..6)
            .filter_map(|_| SelectionPolicy::RoundRobin.pick(&cursor, 3))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn random_stays_in_range() {
        let cursor = AtomicUsize::new(0);
        for _ in 0..100 {
            let idx = SelectionPolicy::Random.pick(&cursor, 4).unwrap();
            assert!(idx < 4);
        }
    }

    #[test]
    fn empty_pool_has_no_pick() {
        let cursor = AtomicUsize::new(0);
        assert!(SelectionPolicy::RoundRobin.pick(&cursor, 0).is_none());
        assert!(SelectionPolicy::Random.pick(&cursor, 0).is_none());
    }
}
