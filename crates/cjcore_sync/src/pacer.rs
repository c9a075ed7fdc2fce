//! Query pacing.

/// Decides on which ticks a displayed target is re-queried.
///
/// The first tick always fires, then one tick out of every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPacer {
    interval: u32,
    countdown: u32,
}

impl QueryPacer {
    /// Fire once every `interval` ticks. Zero is treated as one.
    #[must_use]
    pub const fn new(interval: u32) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
            countdown: 0,
        }
    }

    /// Ticks between two queries.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Advance one tick; returns whether a query should be sent now.
    pub fn tick(&mut self) -> bool {
        if self.countdown == 0 {
            self.countdown = self.interval - 1;
            true
        } else {
            self.countdown -= 1;
            false
        }
    }

    /// Fire again on the next tick (e.g. when the displayed target changes).
    pub fn reset(&mut self) {
        self.countdown = 0;
    }
}

impl Default for QueryPacer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_QUERY_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_default_fires_every_twenty_ticks() {
        let mut pacer = QueryPacer::default();
        let fired: Vec<usize> = (0..45).filter(|_| pacer.tick()).collect();
        assert_eq!(fired, vec![0, 20, 40]);
    }

    #[test]
    fn test_reset_fires_next_tick() {
        let mut pacer = QueryPacer::new(10);
        assert!(pacer.tick());
        assert!(!pacer.tick());
        pacer.reset();
        assert!(pacer.tick());
    }

    #[test]
    fn test_zero_interval_fires_every_tick() {
        let mut pacer = QueryPacer::new(0);
        assert_eq!(pacer.interval(), 1);
        assert!((0..5).all(|_| pacer.tick()));
    }

    proptest! {
        #[test]
        fn prop_fire_count(interval in 1u32..50, ticks in 0usize..500) {
            let mut pacer = QueryPacer::new(interval);
            let fired = (0..ticks).filter(|_| pacer.tick()).count();
            prop_assert_eq!(fired, ticks.div_ceil(interval as usize));
        }
    }
}
