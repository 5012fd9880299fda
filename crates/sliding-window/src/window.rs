//! Time-Horizon Window Implementation

use crate::WindowError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Time-bounded FIFO buffer of timestamped samples.
///
/// Timestamps are expected to be monotonically increasing across pushes.
/// After every `push(now, ..)` all retained entries satisfy
/// `timestamp >= now - horizon`.
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    entries: VecDeque<(Instant, T)>,
    horizon: Duration,
}

impl<T> SlidingWindow<T> {
    /// Create a window with the given retention horizon
    pub fn new(horizon: Duration) -> Result<Self, WindowError> {
        if horizon.is_zero() {
            return Err(WindowError::InvalidHorizon);
        }
        Ok(Self {
            entries: VecDeque::new(),
            horizon,
        })
    }

    /// Append a sample and evict everything older than the horizon
    pub fn push(&mut self, now: Instant, value: T) {
        self.entries.push_back((now, value));
        self.evict(now);
    }

    fn evict(&mut self, now: Instant) {
        while let Some((ts, _)) = self.entries.front() {
            if now.saturating_duration_since(*ts) > self.horizon {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retention horizon
    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Iterate retained samples in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(Instant, T)> {
        self.entries.iter()
    }

    /// Count retained samples matching a predicate
    pub fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.entries.iter().filter(|(_, v)| pred(v)).count()
    }

    /// Most recent sample, if any
    pub fn latest(&self) -> Option<&(Instant, T)> {
        self.entries.back()
    }

    /// Drop all retained samples
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let window = SlidingWindow::<bool>::new(Duration::ZERO);
        assert_eq!(window.unwrap_err(), WindowError::InvalidHorizon);
    }

    #[test]
    fn test_evicts_beyond_horizon() {
        let base = Instant::now();
        let mut window = SlidingWindow::new(secs(5.0)).unwrap();

        window.push(base, 1u32);
        window.push(base + secs(2.0), 2);
        window.push(base + secs(6.0), 3);

        // Entry at t=0 is older than 6.0 - 5.0, entry at t=2 is not
        assert_eq!(window.len(), 2);
        assert_eq!(window.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_keeps_entry_exactly_at_horizon() {
        let base = Instant::now();
        let mut window = SlidingWindow::new(secs(5.0)).unwrap();

        window.push(base, 1u32);
        window.push(base + secs(5.0), 2);

        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_count_where() {
        let base = Instant::now();
        let mut window = SlidingWindow::new(secs(10.0)).unwrap();

        for i in 0..6u32 {
            window.push(base + secs(i as f64), i % 2 == 0);
        }

        assert_eq!(window.count_where(|&closed| closed), 3);
    }

    proptest! {
        /// After every push, all retained entries are within the horizon and
        /// none of the pushed entries still within the horizon were dropped.
        #[test]
        fn prop_retention_invariant(offsets_ms in proptest::collection::vec(0u64..60_000, 1..120)) {
            let mut offsets = offsets_ms;
            offsets.sort_unstable();

            let horizon = secs(10.0);
            let base = Instant::now();
            let mut window = SlidingWindow::new(horizon).unwrap();

            for (i, &off) in offsets.iter().enumerate() {
                let now = base + Duration::from_millis(off);
                window.push(now, off);

                for (ts, _) in window.iter() {
                    prop_assert!(now.saturating_duration_since(*ts) <= horizon);
                }

                let expected = offsets[..=i]
                    .iter()
                    .filter(|&&o| Duration::from_millis(off - o) <= horizon)
                    .count();
                prop_assert_eq!(window.len(), expected);
            }
        }
    }
}
