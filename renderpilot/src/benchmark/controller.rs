//! The benchmark state machine.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use super::preset::QualityPreset;
use super::report::{recommend, BenchmarkReport, BenchmarkResult};
use crate::clock::{SharedClock, SystemClock};
use crate::features::{ConfigurationError, FeatureConfiguration};

/// Default time spent on each preset.
pub const DEFAULT_TEST_DURATION: Duration = Duration::from_secs(5);

/// Default recommendation tiers, tried in order.
pub const DEFAULT_TIERS: [f64; 3] = [60.0, 35.0, 24.0];

/// Benchmark errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BenchmarkError {
    /// `start` called while a run is in flight.
    #[error("Benchmark already running")]
    AlreadyRunning,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Tuning for [`BenchmarkController`].
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    /// Time spent on each preset.
    pub test_duration: Duration,

    /// Presets in ascending quality order.
    pub presets: Vec<QualityPreset>,

    /// Minimum average FPS per tier, tried in order.
    pub tiers: Vec<f64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            test_duration: DEFAULT_TEST_DURATION,
            presets: QualityPreset::default_ladder(),
            tiers: DEFAULT_TIERS.to_vec(),
        }
    }
}

impl BenchmarkConfig {
    pub fn with_test_duration(mut self, duration: Duration) -> Self {
        self.test_duration = duration;
        self
    }

    pub fn with_presets(mut self, presets: Vec<QualityPreset>) -> Self {
        self.presets = presets;
        self
    }

    pub fn with_tiers(mut self, tiers: Vec<f64>) -> Self {
        self.tiers = tiers;
        self
    }

    /// Reject configurations that cannot produce a recommendation.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.presets.is_empty() {
            return Err(ConfigurationError::invalid("presets", "list is empty"));
        }
        if self.test_duration.is_zero() {
            return Err(ConfigurationError::invalid(
                "test_duration",
                "must be greater than zero",
            ));
        }
        if let Some(tier) = self.tiers.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(ConfigurationError::invalid(
                "tiers",
                format!("{} is not a valid frame rate", tier),
            ));
        }
        Ok(())
    }
}

/// Benchmark lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for BenchmarkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkPhase::Idle => write!(f, "idle"),
            BenchmarkPhase::Running => write!(f, "running"),
            BenchmarkPhase::Completed => write!(f, "completed"),
            BenchmarkPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What the host should do after an [`update`](BenchmarkController::update).
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkEvent<S> {
    /// Apply this preset; it is now being measured.
    PresetStarted { index: usize, preset: QualityPreset },

    /// The run finished. `saved` is the configuration passed to `start`.
    Completed { report: BenchmarkReport, saved: S },
}

/// Incremental per-preset accumulators.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: u64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, fps: f64) {
        self.sum += fps;
        self.count += 1;
        self.min = self.min.min(fps);
        self.max = self.max.max(fps);
    }

    fn finish(&self, preset_name: &str, elapsed: Duration) -> BenchmarkResult {
        let (average_fps, min_fps, max_fps) = if self.count == 0 {
            (0.0, 0.0, 0.0)
        } else {
            (self.sum / self.count as f64, self.min, self.max)
        };
        BenchmarkResult {
            preset_name: preset_name.to_string(),
            average_fps,
            min_fps,
            max_fps,
            average_frame_time_ms: if average_fps > 0.0 {
                1000.0 / average_fps
            } else {
                0.0
            },
            test_duration_seconds: elapsed.as_secs_f64(),
            samples: self.count,
        }
    }
}

/// State that exists only while a run is in flight.
#[derive(Debug)]
struct RunState<S> {
    preset_index: usize,
    preset_started_at: Instant,
    accumulator: Accumulator,
    saved: S,
}

/// Drives presets through a timed measurement run.
///
/// `S` is whatever the host wants back on cancel or completion; by default
/// the active [`FeatureConfiguration`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use renderpilot::benchmark::{BenchmarkConfig, BenchmarkController, BenchmarkEvent};
/// use renderpilot::clock::ManualClock;
/// use renderpilot::features::FeatureConfiguration;
///
/// let clock = ManualClock::shared();
/// let mut bench = BenchmarkController::with_clock(BenchmarkConfig::default(), clock.clone()).unwrap();
/// bench.start(FeatureConfiguration::baseline()).unwrap();
///
/// let mut report = None;
/// while report.is_none() {
///     clock.advance(Duration::from_millis(100));
///     if let Some(BenchmarkEvent::Completed { report: r, .. }) = bench.update(90.0) {
///         report = Some(r);
///     }
/// }
/// assert_eq!(report.unwrap().recommendation.preset_name, "ultra");
/// ```
#[derive(Debug)]
pub struct BenchmarkController<S = FeatureConfiguration> {
    config: BenchmarkConfig,
    clock: SharedClock,
    phase: BenchmarkPhase,
    run: Option<RunState<S>>,
    results: Vec<BenchmarkResult>,
    report: Option<BenchmarkReport>,
}

impl<S> BenchmarkController<S> {
    /// Create an idle controller on the system clock.
    pub fn new(config: BenchmarkConfig) -> Result<Self, BenchmarkError> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Create an idle controller on an explicit clock.
    pub fn with_clock(config: BenchmarkConfig, clock: SharedClock) -> Result<Self, BenchmarkError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            phase: BenchmarkPhase::Idle,
            run: None,
            results: Vec::new(),
            report: None,
        })
    }

    /// Begin a run, remembering `current` for restoration.
    ///
    /// Returns the first preset, which the caller should apply. Starting from
    /// `Completed` or `Cancelled` discards the previous run.
    pub fn start(&mut self, current: S) -> Result<&QualityPreset, BenchmarkError> {
        if self.phase == BenchmarkPhase::Running {
            return Err(BenchmarkError::AlreadyRunning);
        }

        self.results.clear();
        self.report = None;
        self.run = Some(RunState {
            preset_index: 0,
            preset_started_at: self.clock.now(),
            accumulator: Accumulator::new(),
            saved: current,
        });
        self.phase = BenchmarkPhase::Running;

        let first = &self.config.presets[0];
        tracing::info!(
            presets = self.config.presets.len(),
            test_duration_secs = self.config.test_duration.as_secs_f64(),
            first = %first.name,
            "Benchmark started"
        );
        Ok(first)
    }

    /// Feed one FPS reading.
    ///
    /// Non-finite and negative readings are ignored but still let the preset
    /// timer expire. Does nothing unless running.
    pub fn update(&mut self, fps: f64) -> Option<BenchmarkEvent<S>> {
        if self.phase != BenchmarkPhase::Running {
            return None;
        }
        let now = self.clock.now();
        let run = self.run.as_mut()?;

        if fps.is_finite() && fps >= 0.0 {
            run.accumulator.push(fps);
        }

        let elapsed = now.saturating_duration_since(run.preset_started_at);
        if elapsed <= self.config.test_duration {
            return None;
        }

        let preset = &self.config.presets[run.preset_index];
        let result = run.accumulator.finish(&preset.name, elapsed);
        tracing::info!(
            preset = %preset.name,
            average_fps = result.average_fps,
            min_fps = result.min_fps,
            max_fps = result.max_fps,
            samples = result.samples,
            "Benchmark preset finished"
        );
        self.results.push(result);

        let next = run.preset_index + 1;
        if let Some(preset) = self.config.presets.get(next) {
            run.preset_index = next;
            run.preset_started_at = now;
            run.accumulator = Accumulator::new();
            tracing::debug!(index = next, preset = %preset.name, "Benchmark preset started");
            return Some(BenchmarkEvent::PresetStarted {
                index: next,
                preset: preset.clone(),
            });
        }

        self.complete()
    }

    /// Abort the run, discard partial results and hand back the
    /// configuration passed to [`start`](Self::start).
    ///
    /// Returns `None` when nothing is running.
    pub fn cancel(&mut self) -> Option<S> {
        if self.phase != BenchmarkPhase::Running {
            return None;
        }
        let run = self.run.take()?;
        self.results.clear();
        self.report = None;
        self.phase = BenchmarkPhase::Cancelled;
        tracing::info!(preset_index = run.preset_index, "Benchmark cancelled");
        Some(run.saved)
    }

    /// Return to `Idle`, dropping results and any in-flight run.
    pub fn reset(&mut self) {
        self.phase = BenchmarkPhase::Idle;
        self.run = None;
        self.results.clear();
        self.report = None;
    }

    /// Elapsed fraction of the in-flight preset, in `[0, 1]`.
    pub fn current_progress(&self) -> f64 {
        match (&self.phase, &self.run) {
            (BenchmarkPhase::Running, Some(run)) => {
                let elapsed = self
                    .clock
                    .now()
                    .saturating_duration_since(run.preset_started_at);
                (elapsed.as_secs_f64() / self.config.test_duration.as_secs_f64()).clamp(0.0, 1.0)
            }
            (BenchmarkPhase::Completed, _) => 1.0,
            _ => 0.0,
        }
    }

    /// Fraction of the whole run, in `[0, 1]`.
    pub fn overall_progress(&self) -> f64 {
        match (&self.phase, &self.run) {
            (BenchmarkPhase::Running, Some(run)) => {
                (run.preset_index as f64 + self.current_progress())
                    / self.config.presets.len() as f64
            }
            (BenchmarkPhase::Completed, _) => 1.0,
            _ => 0.0,
        }
    }

    pub fn phase(&self) -> BenchmarkPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == BenchmarkPhase::Running
    }

    /// Index of the preset being measured.
    pub fn current_preset_index(&self) -> Option<usize> {
        self.run.as_ref().map(|run| run.preset_index)
    }

    /// Preset being measured.
    pub fn current_preset(&self) -> Option<&QualityPreset> {
        self.current_preset_index()
            .and_then(|index| self.config.presets.get(index))
    }

    /// Results of presets finished so far.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Report of the last completed run.
    pub fn report(&self) -> Option<&BenchmarkReport> {
        self.report.as_ref()
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn complete(&mut self) -> Option<BenchmarkEvent<S>> {
        let run = self.run.take()?;
        let recommendation = recommend(&self.results, &self.config.tiers)?;
        let report = BenchmarkReport {
            results: self.results.clone(),
            recommendation,
        };
        self.phase = BenchmarkPhase::Completed;
        self.report = Some(report.clone());

        tracing::info!(
            recommended = %report.recommendation.preset_name,
            average_fps = report.recommendation.average_fps,
            tier_fps = ?report.recommendation.tier_fps,
            "Benchmark completed"
        );
        Some(BenchmarkEvent::Completed {
            report,
            saved: run.saved,
        })
    }
}
