//! Fixed-capacity rolling window with a running sum.

/// Ring buffer of non-negative samples with O(1) average and last value.
///
/// When full, a push overwrites the oldest slot. The overwritten value is
/// subtracted from the running sum before the new one is added, so the sum
/// tracks the samples currently held. Evicting a sample that dominates the
/// sum re-sums the window, since the smaller samples it absorbed would
/// otherwise be lost.
///
/// # Example
///
/// ```
/// use renderpilot::monitor::RollingStatistics;
///
/// let mut stats = RollingStatistics::new(3);
/// for v in [1.0, 2.0, 3.0, 4.0] {
///     stats.push(v);
/// }
/// assert_eq!(stats.average(), Some(3.0));
/// assert_eq!(stats.last(), Some(4.0));
/// ```
#[derive(Debug, Clone)]
pub struct RollingStatistics {
    samples: Box<[f64]>,
    running_sum: f64,
    count: usize,
    /// Slot the next push writes to.
    head: usize,
}

impl RollingStatistics {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)].into_boxed_slice(),
            running_sum: 0.0,
            count: 0,
            head: 0,
        }
    }

    /// Add a sample, evicting the oldest when full.
    ///
    /// Non-finite and negative samples are ignored; returns whether the
    /// sample was accepted.
    pub fn push(&mut self, sample: f64) -> bool {
        if !sample.is_finite() || sample < 0.0 {
            return false;
        }

        if self.count == self.samples.len() {
            let evicted = std::mem::replace(&mut self.samples[self.head], sample);
            if evicted * 2.0 > self.running_sum {
                self.running_sum = self.samples.iter().sum();
            } else {
                self.running_sum -= evicted;
                self.running_sum += sample;
            }
        } else {
            self.count += 1;
            self.samples[self.head] = sample;
            self.running_sum += sample;
        }
        self.head = (self.head + 1) % self.samples.len();
        true
    }

    /// Mean of the held samples.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.running_sum / self.count as f64)
        }
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.samples.len();
        Some(self.samples[(self.head + capacity - 1) % capacity])
    }

    /// Smallest held sample. Scans the window: O(n), for diagnostics.
    pub fn min(&self) -> Option<f64> {
        self.iter().reduce(f64::min)
    }

    /// Largest held sample. Scans the window: O(n), for diagnostics.
    pub fn max(&self) -> Option<f64> {
        self.iter().reduce(f64::max)
    }

    /// Number of held samples.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no samples are held.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum number of held samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Whether the next push evicts.
    pub fn is_full(&self) -> bool {
        self.count == self.samples.len()
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.running_sum = 0.0;
        self.count = 0;
        self.head = 0;
    }

    /// Held samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.samples.len();
        let start = (self.head + capacity - self.count) % capacity;
        (0..self.count).map(move |i| self.samples[(start + i) % capacity])
    }
}
