//! Per-frame driver for one render loop.
//!
//! [`AdaptiveSession`] owns the resolution controller, the performance
//! monitor, the benchmark and an idle tracker, and runs them in the right
//! order once per frame:
//!
//! ```text
//! tick(dt, fps, timings)
//!   1. drain SessionCommands from the channel
//!   2. record timings in the PerformanceMonitor
//!   3. benchmark running?  ── yes ──► BenchmarkController::update(fps)
//!                          └─ no  ──► ResolutionController::update(fps, dt)
//!                                     + debounced configuration requests
//!   4. return FrameDecision
//! ```
//!
//! Resolution control is suspended while a benchmark runs so each preset is
//! measured at its own scale. On completion the loop resumes from the
//! recommended preset's scale.
//!
//! The session itself is single-threaded. Other threads (UI, telemetry)
//! talk to it only through [`SessionCommand`]s sent on the channel returned
//! by [`AdaptiveSession::command_sender`].

use std::time::Duration;

use tokio::sync::mpsc;

use crate::benchmark::{BenchmarkConfig, BenchmarkController, BenchmarkError, BenchmarkEvent};
use crate::clock::{SharedClock, SystemClock};
use crate::features::{ConfigurationError, FeatureConfiguration};
use crate::monitor::{MonitorConfig, PerformanceMonitor};
use crate::resolution::{ResolutionConfig, ResolutionController};
use crate::util::{Debouncer, IdleTracker};

pub use crate::monitor::FrameTimings;

/// Default quiet time before a requested configuration is applied.
pub const DEFAULT_CONFIGURATION_DEBOUNCE: Duration = Duration::from_millis(250);

/// Default inactivity before the session reports idle.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(30);

/// Messages other threads may send to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Turn dynamic resolution on or off.
    SetResolutionEnabled(bool),
    /// Return the resolution loop to full scale.
    ResetResolution,
    /// Drop the resolution target one step now (resource exhaustion).
    StepDown,
    /// Switch to a configuration once requests stop arriving.
    RequestConfiguration(FeatureConfiguration),
    StartBenchmark,
    CancelBenchmark,
    /// User input was seen.
    UserActivity,
}

/// Everything the host needs to act on after one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDecision {
    /// Frames ticked so far, this one included.
    pub frame: u64,
    /// Render scale to use for the next frame.
    pub resolution_scale: f64,
    /// Configuration to switch to, if it changed this frame.
    pub apply_configuration: Option<FeatureConfiguration>,
    /// Benchmark progress that happened this frame.
    pub benchmark_event: Option<BenchmarkEvent<FeatureConfiguration>>,
    pub idle: bool,
    pub reduce_quality: bool,
    pub increase_quality: bool,
}

/// Tuning for every component a session owns.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub resolution: ResolutionConfig,
    pub monitor: MonitorConfig,
    pub benchmark: BenchmarkConfig,
    pub idle_threshold: Duration,
    pub configuration_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionConfig::default(),
            monitor: MonitorConfig::default(),
            benchmark: BenchmarkConfig::default(),
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            configuration_debounce: DEFAULT_CONFIGURATION_DEBOUNCE,
        }
    }
}

/// Adaptive quality driver for one render loop.
#[derive(Debug)]
pub struct AdaptiveSession {
    resolution: ResolutionController,
    monitor: PerformanceMonitor,
    benchmark: BenchmarkController<FeatureConfiguration>,
    idle: IdleTracker,
    requested: Debouncer<FeatureConfiguration>,
    active: FeatureConfiguration,
    benchmark_scale: Option<f64>,
    frame: u64,
    commands_tx: mpsc::UnboundedSender<SessionCommand>,
    commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl AdaptiveSession {
    /// Create a session on the system clock.
    pub fn new(
        config: SessionConfig,
        initial: FeatureConfiguration,
    ) -> Result<Self, ConfigurationError> {
        Self::with_clock(config, initial, SystemClock::shared())
    }

    /// Create a session on an explicit clock.
    pub fn with_clock(
        config: SessionConfig,
        initial: FeatureConfiguration,
        clock: SharedClock,
    ) -> Result<Self, ConfigurationError> {
        let resolution = ResolutionController::new(config.resolution)?;
        let benchmark = BenchmarkController::with_clock(config.benchmark, clock.clone())
            .map_err(|err| match err {
                BenchmarkError::Configuration(inner) => inner,
                other => ConfigurationError::invalid("benchmark", other.to_string()),
            })?;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        Ok(Self {
            resolution,
            monitor: PerformanceMonitor::new(config.monitor),
            benchmark,
            idle: IdleTracker::with_clock(config.idle_threshold, clock.clone()),
            requested: Debouncer::with_clock(config.configuration_debounce, clock),
            active: initial,
            benchmark_scale: None,
            frame: 0,
            commands_tx,
            commands_rx,
        })
    }

    /// Sender for cross-thread commands. Cheap to clone.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<SessionCommand> {
        self.commands_tx.clone()
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f64, fps: f64, timings: &FrameTimings) -> FrameDecision {
        self.frame += 1;
        let mut decision = FrameDecision {
            frame: self.frame,
            resolution_scale: self.resolution.current_scale(),
            apply_configuration: None,
            benchmark_event: None,
            idle: false,
            reduce_quality: false,
            increase_quality: false,
        };

        while let Ok(command) = self.commands_rx.try_recv() {
            self.handle_command(command, &mut decision);
        }

        self.monitor.record(timings);

        if self.benchmark.is_running() {
            if let Some(event) = self.benchmark.update(fps) {
                self.handle_benchmark_event(&event, &mut decision);
                decision.benchmark_event = Some(event);
            }
        } else {
            self.resolution.update(fps, dt);
            if let Some(configuration) = self.requested.poll() {
                self.apply(configuration, &mut decision);
            }
        }

        decision.resolution_scale = self
            .benchmark_scale
            .unwrap_or_else(|| self.resolution.current_scale());
        decision.idle = self.idle.is_idle();
        decision.reduce_quality = self.monitor.should_reduce_quality();
        decision.increase_quality = self.monitor.should_increase_quality();
        decision
    }

    /// Configuration the host should currently be rendering with.
    pub fn active_configuration(&self) -> FeatureConfiguration {
        self.active
    }

    pub fn resolution(&self) -> &ResolutionController {
        &self.resolution
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn benchmark(&self) -> &BenchmarkController<FeatureConfiguration> {
        &self.benchmark
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn handle_command(&mut self, command: SessionCommand, decision: &mut FrameDecision) {
        tracing::debug!(command = ?command, frame = self.frame, "Session command");
        match command {
            SessionCommand::SetResolutionEnabled(enabled) => self.resolution.set_enabled(enabled),
            SessionCommand::ResetResolution => self.resolution.reset(),
            SessionCommand::StepDown => {
                self.resolution.step_down();
            }
            SessionCommand::RequestConfiguration(configuration) => {
                self.requested.call(configuration)
            }
            SessionCommand::StartBenchmark => match self.benchmark.start(self.active) {
                Ok(preset) => {
                    let preset = preset.clone();
                    if self.requested.cancel().is_some() {
                        tracing::debug!("Pending configuration request dropped for benchmark");
                    }
                    self.benchmark_scale = Some(preset.resolution_scale);
                    self.apply(preset.configuration, decision);
                }
                Err(err) => tracing::warn!(error = %err, "Benchmark not started"),
            },
            SessionCommand::CancelBenchmark => {
                if let Some(saved) = self.benchmark.cancel() {
                    self.benchmark_scale = None;
                    self.apply(saved, decision);
                }
            }
            SessionCommand::UserActivity => self.idle.record_activity(),
        }
    }

    fn handle_benchmark_event(
        &mut self,
        event: &BenchmarkEvent<FeatureConfiguration>,
        decision: &mut FrameDecision,
    ) {
        match event {
            BenchmarkEvent::PresetStarted { preset, .. } => {
                self.benchmark_scale = Some(preset.resolution_scale);
                self.apply(preset.configuration, decision);
            }
            BenchmarkEvent::Completed { report, .. } => {
                self.benchmark_scale = None;
                let index = report.recommendation.preset_index;
                if let Some(preset) = self.benchmark.config().presets.get(index) {
                    let (configuration, scale) = (preset.configuration, preset.resolution_scale);
                    self.resolution.start_at(scale);
                    self.apply(configuration, decision);
                }
            }
        }
    }

    fn apply(&mut self, configuration: FeatureConfiguration, decision: &mut FrameDecision) {
        if configuration != self.active {
            tracing::info!(from = %self.active, to = %configuration, "Configuration changed");
            self.active = configuration;
        }
        decision.apply_configuration = Some(configuration);
    }
}
