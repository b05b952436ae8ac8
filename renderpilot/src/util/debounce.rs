use std::time::{Duration, Instant};

use crate::clock::{SharedClock, SystemClock};

/// Holds back a value until calls stop for `delay`.
///
/// Every [`call`](Self::call) replaces the pending value and restarts the
/// wait. [`poll`](Self::poll) hands the value out exactly once, after the
/// wait has elapsed.
///
/// ```
/// use std::time::Duration;
/// use renderpilot::clock::ManualClock;
/// use renderpilot::util::Debouncer;
///
/// let clock = ManualClock::shared();
/// let mut debouncer = Debouncer::with_clock(Duration::from_millis(200), clock.clone());
///
/// debouncer.call("a");
/// clock.advance(Duration::from_millis(150));
/// debouncer.call("b");
/// clock.advance(Duration::from_millis(150));
/// assert_eq!(debouncer.poll(), None);
///
/// clock.advance(Duration::from_millis(50));
/// assert_eq!(debouncer.poll(), Some("b"));
/// assert_eq!(debouncer.poll(), None);
/// ```
#[derive(Debug)]
pub struct Debouncer<A> {
    delay: Duration,
    clock: SharedClock,
    pending: Option<(A, Instant)>,
    deliveries: u64,
}

impl<A> Debouncer<A> {
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock::shared())
    }

    pub fn with_clock(delay: Duration, clock: SharedClock) -> Self {
        Self {
            delay,
            clock,
            pending: None,
            deliveries: 0,
        }
    }

    /// Replace the pending value and restart the wait.
    pub fn call(&mut self, args: A) {
        self.pending = Some((args, self.clock.now()));
    }

    /// Take the pending value if the wait has elapsed.
    pub fn poll(&mut self) -> Option<A> {
        let (_, called_at) = self.pending.as_ref()?;
        if self.clock.now().saturating_duration_since(*called_at) < self.delay {
            return None;
        }
        self.deliver()
    }

    /// Take the pending value now, without waiting.
    pub fn flush(&mut self) -> Option<A> {
        self.deliver()
    }

    /// Drop the pending value undelivered.
    pub fn cancel(&mut self) -> Option<A> {
        self.pending.take().map(|(args, _)| args)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Values handed out so far.
    pub fn deliveries(&self) -> u64 {
        self.deliveries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn deliver(&mut self) -> Option<A> {
        let (args, _) = self.pending.take()?;
        self.deliveries += 1;
        Some(args)
    }
}
