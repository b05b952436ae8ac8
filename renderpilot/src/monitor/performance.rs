//! Per-channel frame timing monitor.

use std::cell::Cell;

use serde::Serialize;

use super::rolling::RollingStatistics;

/// Default window length in frames.
pub const DEFAULT_WINDOW: usize = 60;

/// Tuning for [`PerformanceMonitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Frames kept per channel.
    pub window: usize,

    /// Average frame time above which quality should drop (ms).
    pub reduce_frame_ms: f64,

    /// Average frame time below which quality may rise, once the window is
    /// full (ms).
    pub increase_frame_ms: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            reduce_frame_ms: 20.0,
            increase_frame_ms: 12.0,
        }
    }
}

impl MonitorConfig {
    /// Set the window length.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the frame-time thresholds.
    pub fn with_thresholds(mut self, reduce_frame_ms: f64, increase_frame_ms: f64) -> Self {
        self.reduce_frame_ms = reduce_frame_ms;
        self.increase_frame_ms = increase_frame_ms;
        self
    }
}

/// One frame's timings in milliseconds.
///
/// Only the total frame time is mandatory; hosts without GPU timer queries
/// leave the split channels empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameTimings {
    pub frame_ms: f64,
    pub cpu_ms: Option<f64>,
    pub gpu_ms: Option<f64>,
    pub idle_ms: Option<f64>,
}

impl FrameTimings {
    /// Timings with only the total frame time.
    pub fn from_frame_ms(frame_ms: f64) -> Self {
        Self {
            frame_ms,
            ..Self::default()
        }
    }

    /// Timings derived from an FPS reading. Zero or invalid FPS yields an
    /// invalid frame time, which the monitor ignores.
    pub fn from_fps(fps: f64) -> Self {
        Self::from_frame_ms(if fps > 0.0 { 1000.0 / fps } else { f64::NAN })
    }

    pub fn with_cpu_ms(mut self, ms: f64) -> Self {
        self.cpu_ms = Some(ms);
        self
    }

    pub fn with_gpu_ms(mut self, ms: f64) -> Self {
        self.gpu_ms = Some(ms);
        self
    }

    pub fn with_idle_ms(mut self, ms: f64) -> Self {
        self.idle_ms = Some(ms);
        self
    }
}

/// Serializable view of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub samples: usize,
    pub avg_frame_ms: Option<f64>,
    pub avg_cpu_ms: Option<f64>,
    pub avg_gpu_ms: Option<f64>,
    pub avg_idle_ms: Option<f64>,
    pub min_frame_ms: Option<f64>,
    pub max_frame_ms: Option<f64>,
    /// Derived from the average frame time.
    pub fps: Option<f64>,
}

/// Rolling frame, CPU, GPU and idle time.
///
/// The frame-time average used by the quality decisions is cached: a push
/// invalidates it and the next query recomputes it once.
#[derive(Debug)]
pub struct PerformanceMonitor {
    config: MonitorConfig,
    frame: RollingStatistics,
    cpu: RollingStatistics,
    gpu: RollingStatistics,
    idle: RollingStatistics,
    cached_frame_avg: Cell<Option<Option<f64>>>,
    recomputations: Cell<u64>,
}

impl PerformanceMonitor {
    /// Create an empty monitor.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            frame: RollingStatistics::new(config.window),
            cpu: RollingStatistics::new(config.window),
            gpu: RollingStatistics::new(config.window),
            idle: RollingStatistics::new(config.window),
            config,
            cached_frame_avg: Cell::new(None),
            recomputations: Cell::new(0),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MonitorConfig::default())
    }

    /// Record one frame. Invalid values are dropped per channel.
    pub fn record(&mut self, timings: &FrameTimings) {
        if self.frame.push(timings.frame_ms) {
            self.cached_frame_avg.set(None);
        }
        if let Some(ms) = timings.cpu_ms {
            self.cpu.push(ms);
        }
        if let Some(ms) = timings.gpu_ms {
            self.gpu.push(ms);
        }
        if let Some(ms) = timings.idle_ms {
            self.idle.push(ms);
        }
    }

    /// Record only a total frame time.
    pub fn push_frame_time(&mut self, frame_ms: f64) {
        self.record(&FrameTimings::from_frame_ms(frame_ms));
    }

    /// Rolling average frame time (ms), cached until the next push.
    pub fn average_frame_ms(&self) -> Option<f64> {
        if let Some(cached) = self.cached_frame_avg.get() {
            return cached;
        }
        let avg = self.frame.average();
        self.cached_frame_avg.set(Some(avg));
        self.recomputations.set(self.recomputations.get() + 1);
        avg
    }

    /// Average frame time is over the reduce threshold.
    pub fn should_reduce_quality(&self) -> bool {
        self.average_frame_ms()
            .is_some_and(|avg| avg > self.config.reduce_frame_ms)
    }

    /// A full window averages under the increase threshold.
    pub fn should_increase_quality(&self) -> bool {
        self.frame.is_full()
            && self
                .average_frame_ms()
                .is_some_and(|avg| avg < self.config.increase_frame_ms)
    }

    /// How many times the cached frame average has been recomputed.
    pub fn average_recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    pub fn frame_time(&self) -> &RollingStatistics {
        &self.frame
    }

    pub fn cpu_time(&self) -> &RollingStatistics {
        &self.cpu
    }

    pub fn gpu_time(&self) -> &RollingStatistics {
        &self.gpu
    }

    pub fn idle_time(&self) -> &RollingStatistics {
        &self.idle
    }

    /// Current averages and derived FPS.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let avg_frame_ms = self.average_frame_ms();
        PerformanceSnapshot {
            samples: self.frame.len(),
            avg_frame_ms,
            avg_cpu_ms: self.cpu.average(),
            avg_gpu_ms: self.gpu.average(),
            avg_idle_ms: self.idle.average(),
            min_frame_ms: self.frame.min(),
            max_frame_ms: self.frame.max(),
            fps: avg_frame_ms.filter(|ms| *ms > 0.0).map(|ms| 1000.0 / ms),
        }
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.cpu.clear();
        self.gpu.clear();
        self.idle.clear();
        self.cached_frame_avg.set(None);
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_when_slow() {
        let mut monitor = PerformanceMonitor::with_defaults();
        for _ in 0..10 {
            monitor.push_frame_time(33.0);
        }
        assert!(monitor.should_reduce_quality());
        assert!(!monitor.should_increase_quality());
    }

    #[test]
    fn test_increase_needs_full_window() {
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default().with_window(5));
        for _ in 0..4 {
            monitor.push_frame_time(8.0);
        }
        assert!(!monitor.should_increase_quality());

        monitor.push_frame_time(8.0);
        assert!(monitor.should_increase_quality());
        assert!(!monitor.should_reduce_quality());
    }

    #[test]
    fn test_neutral_band() {
        let mut monitor = PerformanceMonitor::new(MonitorConfig::default().with_window(3));
        for _ in 0..3 {
            monitor.push_frame_time(16.0);
        }
        assert!(!monitor.should_reduce_quality());
        assert!(!monitor.should_increase_quality());
    }

    #[test]
    fn test_empty_monitor_makes_no_decision() {
        let monitor = PerformanceMonitor::with_defaults();
        assert!(!monitor.should_reduce_quality());
        assert!(!monitor.should_increase_quality());
        assert_eq!(monitor.snapshot().fps, None);
    }

    #[test]
    fn test_average_cached_between_pushes() {
        let mut monitor = PerformanceMonitor::with_defaults();
        monitor.push_frame_time(10.0);

        monitor.should_reduce_quality();
        monitor.should_increase_quality();
        monitor.average_frame_ms();
        assert_eq!(monitor.average_recomputations(), 1);

        monitor.push_frame_time(20.0);
        monitor.push_frame_time(30.0);
        assert_eq!(monitor.average_recomputations(), 1);

        assert_eq!(monitor.average_frame_ms(), Some(20.0));
        monitor.should_reduce_quality();
        assert_eq!(monitor.average_recomputations(), 2);
    }

    #[test]
    fn test_rejected_sample_keeps_cache() {
        let mut monitor = PerformanceMonitor::with_defaults();
        monitor.push_frame_time(10.0);
        monitor.average_frame_ms();
        monitor.push_frame_time(f64::NAN);
        monitor.push_frame_time(-3.0);
        monitor.average_frame_ms();
        assert_eq!(monitor.average_recomputations(), 1);
    }

    #[test]
    fn test_channels_independent() {
        let mut monitor = PerformanceMonitor::with_defaults();
        monitor.record(
            &FrameTimings::from_frame_ms(16.0)
                .with_cpu_ms(6.0)
                .with_gpu_ms(9.0)
                .with_idle_ms(1.0),
        );
        monitor.record(&FrameTimings::from_frame_ms(18.0).with_gpu_ms(11.0));

        assert_eq!(monitor.frame_time().len(), 2);
        assert_eq!(monitor.cpu_time().len(), 1);
        assert_eq!(monitor.gpu_time().average(), Some(10.0));
        assert_eq!(monitor.idle_time().last(), Some(1.0));
    }

    #[test]
    fn test_snapshot() {
        let mut monitor = PerformanceMonitor::with_defaults();
        monitor.push_frame_time(10.0);
        monitor.push_frame_time(30.0);

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.samples, 2);
        assert_eq!(snapshot.avg_frame_ms, Some(20.0));
        assert_eq!(snapshot.fps, Some(50.0));
        assert_eq!(snapshot.min_frame_ms, Some(10.0));
        assert_eq!(snapshot.max_frame_ms, Some(30.0));

        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["avg_frame_ms"], 20.0);
    }

    #[test]
    fn test_from_fps() {
        assert_eq!(FrameTimings::from_fps(50.0).frame_ms, 20.0);
        assert!(FrameTimings::from_fps(0.0).frame_ms.is_nan());
    }

    #[test]
    fn test_clear() {
        let mut monitor = PerformanceMonitor::with_defaults();
        monitor.push_frame_time(40.0);
        assert!(monitor.should_reduce_quality());
        monitor.clear();
        assert!(!monitor.should_reduce_quality());
        assert_eq!(monitor.average_frame_ms(), None);
    }
}
