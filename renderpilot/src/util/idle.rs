use std::time::{Duration, Instant};

use crate::clock::{SharedClock, SystemClock};

/// Reports idle once no activity has been recorded for `threshold`.
#[derive(Debug)]
pub struct IdleTracker {
    threshold: Duration,
    clock: SharedClock,
    last_activity: Instant,
}

impl IdleTracker {
    /// Start tracking; creation counts as activity.
    pub fn new(threshold: Duration) -> Self {
        Self::with_clock(threshold, SystemClock::shared())
    }

    pub fn with_clock(threshold: Duration, clock: SharedClock) -> Self {
        let last_activity = clock.now();
        Self {
            threshold,
            clock,
            last_activity,
        }
    }

    pub fn record_activity(&mut self) {
        self.last_activity = self.clock.now();
    }

    /// Elapsed time since the last activity exceeds the threshold.
    pub fn is_idle(&self) -> bool {
        self.idle_for() > self.threshold
    }

    /// Time since the last activity.
    pub fn idle_for(&self) -> Duration {
        self.clock
            .now()
            .saturating_duration_since(self.last_activity)
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_idle_after_threshold() {
        let clock = ManualClock::shared();
        let tracker = IdleTracker::with_clock(Duration::from_secs(2), clock.clone());
        assert!(!tracker.is_idle());

        clock.advance(Duration::from_secs(2));
        assert!(!tracker.is_idle());

        clock.advance(Duration::from_millis(1));
        assert!(tracker.is_idle());
        assert_eq!(tracker.idle_for(), Duration::from_millis(2001));
    }

    #[test]
    fn test_activity_resets() {
        let clock = ManualClock::shared();
        let mut tracker = IdleTracker::with_clock(Duration::from_secs(1), clock.clone());
        clock.advance(Duration::from_secs(5));
        assert!(tracker.is_idle());

        tracker.record_activity();
        assert!(!tracker.is_idle());
        assert_eq!(tracker.idle_for(), Duration::ZERO);
    }
}
