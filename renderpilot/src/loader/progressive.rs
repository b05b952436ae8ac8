//! The progressive loader.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use super::error::LoaderError;
use super::state::{CompilationStatus, FeatureCompilationState, LoaderPhase, LoaderState};
use crate::backend::CompilationBackend;
use crate::clock::{SharedClock, SystemClock};
use crate::features::{Feature, FeatureConfiguration};
use crate::variant_cache::{VariantCache, VariantError};

/// Default advisory budget for the baseline compile.
pub const DEFAULT_BASELINE_BUDGET: Duration = Duration::from_secs(1);

/// Configuration for [`ProgressiveLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Baseline compiles slower than this are logged. Never aborts.
    pub baseline_budget: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            baseline_budget: DEFAULT_BASELINE_BUDGET,
        }
    }
}

impl LoaderConfig {
    /// Set the baseline budget.
    pub fn with_baseline_budget(mut self, budget: Duration) -> Self {
        self.baseline_budget = budget;
        self
    }
}

/// Orchestrates incremental compilation of optional capabilities.
///
/// The loader does not own the cache; each step borrows it. That keeps one
/// cache shared between the loader, preset switches and everything else
/// that asks for variants.
///
/// # Example
///
/// ```
/// use renderpilot::backend::SimulatedBackend;
/// use renderpilot::features::{Feature, FeatureConfiguration, QualityLevel};
/// use renderpilot::loader::ProgressiveLoader;
/// use renderpilot::variant_cache::VariantCache;
///
/// let mut cache = VariantCache::new(SimulatedBackend::new().with_failing_define("ENABLE_BLOOM"));
/// let requested = FeatureConfiguration::new(QualityLevel::High)
///     .with(Feature::Lensing)
///     .with(Feature::Bloom);
///
/// let mut loader = ProgressiveLoader::new();
/// let state = loader.initialize(&mut cache, &requested, "void main() {}").unwrap();
///
/// assert!(state.has_basic_rendering);
/// assert!(loader.is_feature_failed(Feature::Bloom));
/// let effective = loader.enabled_features(&requested);
/// assert!(effective.is_enabled(Feature::Lensing));
/// assert!(!effective.is_enabled(Feature::Bloom));
/// ```
#[derive(Debug)]
pub struct ProgressiveLoader {
    config: LoaderConfig,
    clock: SharedClock,
    phase: LoaderPhase,
    base_source: String,
    baseline_pending: bool,
    baseline_error: Option<String>,
    queue: VecDeque<Feature>,
    features: BTreeMap<Feature, FeatureCompilationState>,
    has_basic_rendering: bool,
}

impl ProgressiveLoader {
    /// Create a loader with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default(), SystemClock::shared())
    }

    /// Create a loader with explicit configuration and clock.
    pub fn with_config(config: LoaderConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            phase: LoaderPhase::Idle,
            base_source: String::new(),
            baseline_pending: false,
            baseline_error: None,
            queue: VecDeque::new(),
            features: BTreeMap::new(),
            has_basic_rendering: false,
        }
    }

    /// Start a run for `requested` without compiling anything yet.
    ///
    /// Any previous run is discarded. Drive the run with [`step`](Self::step).
    pub fn begin(
        &mut self,
        requested: &FeatureConfiguration,
        base_source: &str,
    ) -> Result<(), LoaderError> {
        if base_source.trim().is_empty() {
            return Err(LoaderError::InvalidSource);
        }

        self.reset();
        self.base_source = base_source.to_string();
        self.baseline_pending = true;
        self.queue = requested.enabled_features().collect();
        self.features = self
            .queue
            .iter()
            .map(|feature| (*feature, FeatureCompilationState::pending()))
            .collect();
        self.phase = LoaderPhase::Initializing;

        tracing::info!(
            requested = %requested,
            features = self.queue.len(),
            "Progressive load started"
        );
        Ok(())
    }

    /// Compile the next unit of work: the baseline first, then one
    /// capability per call.
    ///
    /// Returns the phase after the step. Calling `step` while idle or
    /// complete does nothing.
    pub fn step<B: CompilationBackend>(
        &mut self,
        cache: &mut VariantCache<B>,
    ) -> Result<LoaderPhase, LoaderError> {
        if self.phase != LoaderPhase::Initializing {
            return Ok(self.phase);
        }

        if self.baseline_pending {
            self.compile_baseline(cache)?;
        } else if let Some(feature) = self.queue.pop_front() {
            self.compile_feature(cache, feature)?;
        }

        if !self.baseline_pending && self.queue.is_empty() {
            self.finish();
        }
        Ok(self.phase)
    }

    /// Run a complete load: [`begin`](Self::begin), then
    /// [`step`](Self::step) until complete.
    pub fn initialize<B: CompilationBackend>(
        &mut self,
        cache: &mut VariantCache<B>,
        requested: &FeatureConfiguration,
        base_source: &str,
    ) -> Result<LoaderState, LoaderError> {
        self.begin(requested, base_source)?;
        while self.step(cache)? == LoaderPhase::Initializing {}
        Ok(self.state())
    }

    /// Effective configuration: each requested capability stays enabled only
    /// if it compiled. The requested quality is kept.
    pub fn enabled_features(&self, requested: &FeatureConfiguration) -> FeatureConfiguration {
        Feature::ALL.into_iter().fold(
            FeatureConfiguration::new(requested.quality()),
            |effective, feature| {
                let enabled = requested.is_enabled(feature)
                    && self.is_feature_ready(feature)
                    && !self.is_feature_failed(feature);
                effective.with_feature(feature, enabled)
            },
        )
    }

    /// Whether a capability compiled in the current run.
    pub fn is_feature_ready(&self, feature: Feature) -> bool {
        self.status(feature) == Some(CompilationStatus::Succeeded)
    }

    /// Whether a capability failed in the current run.
    pub fn is_feature_failed(&self, feature: Feature) -> bool {
        self.status(feature) == Some(CompilationStatus::Failed)
    }

    /// Compiler log for a failed capability.
    pub fn feature_error(&self, feature: Feature) -> Option<&str> {
        self.features
            .get(&feature)
            .and_then(|state| state.error.as_deref())
    }

    /// Record for one capability, if it was requested.
    pub fn feature_state(&self, feature: Feature) -> Option<&FeatureCompilationState> {
        self.features.get(&feature)
    }

    /// Compiler log for a failed baseline.
    pub fn baseline_error(&self) -> Option<&str> {
        self.baseline_error.as_deref()
    }

    /// Whether the baseline program compiled.
    pub fn has_basic_rendering(&self) -> bool {
        self.has_basic_rendering
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    /// Snapshot of the loader.
    pub fn state(&self) -> LoaderState {
        let total = self.features.len();
        let resolved = self
            .features
            .values()
            .filter(|state| state.status.is_terminal())
            .count();
        let is_complete = self.phase == LoaderPhase::Complete;

        let overall_progress = if total == 0 {
            if is_complete {
                1.0
            } else {
                0.0
            }
        } else {
            resolved as f64 / total as f64
        };

        LoaderState {
            phase: self.phase,
            features: self.features.clone(),
            overall_progress,
            is_complete,
            has_basic_rendering: self.has_basic_rendering,
        }
    }

    /// Forget the current run. Safe to call at any time, any number of times.
    pub fn reset(&mut self) {
        if self.phase == LoaderPhase::Initializing {
            tracing::debug!(
                remaining = self.queue.len(),
                "Progressive load abandoned by reset"
            );
        }
        self.phase = LoaderPhase::Idle;
        self.base_source.clear();
        self.baseline_pending = false;
        self.baseline_error = None;
        self.queue.clear();
        self.features.clear();
        self.has_basic_rendering = false;
    }

    fn status(&self, feature: Feature) -> Option<CompilationStatus> {
        self.features.get(&feature).map(|state| state.status)
    }

    fn compile_baseline<B: CompilationBackend>(
        &mut self,
        cache: &mut VariantCache<B>,
    ) -> Result<(), LoaderError> {
        let baseline = FeatureConfiguration::baseline();
        let started = self.clock.now();
        let result = cache.get_or_compile(&self.base_source, &baseline);
        let elapsed = self.clock.now().saturating_duration_since(started);

        if elapsed > self.config.baseline_budget {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis(),
                budget_ms = self.config.baseline_budget.as_millis(),
                "Baseline compile exceeded time budget"
            );
        }

        match result {
            Ok(_) => {
                self.has_basic_rendering = true;
                tracing::info!(
                    elapsed_ms = elapsed.as_millis(),
                    "Baseline rendering ready"
                );
            }
            Err(err) => {
                let log = Self::failure_log(err)?;
                tracing::error!(log = %log, "Baseline compile failed");
                self.baseline_error = Some(log);
            }
        }

        self.baseline_pending = false;
        Ok(())
    }

    fn compile_feature<B: CompilationBackend>(
        &mut self,
        cache: &mut VariantCache<B>,
        feature: Feature,
    ) -> Result<(), LoaderError> {
        let Some(state) = self.features.get_mut(&feature) else {
            return Ok(());
        };
        if !state.start() {
            tracing::debug!(feature = %feature, status = %state.status, "Skipping feature, not pending");
            return Ok(());
        }

        let config = FeatureConfiguration::baseline().with(feature);
        let started = self.clock.now();
        let result = cache.get_or_compile(&self.base_source, &config);
        let elapsed = self.clock.now().saturating_duration_since(started);

        match result {
            Ok(_) => {
                state.succeed(elapsed);
                tracing::info!(
                    feature = %feature,
                    elapsed_ms = elapsed.as_millis(),
                    "Feature compiled"
                );
            }
            Err(err) => match Self::failure_log(err) {
                Ok(log) => {
                    tracing::warn!(feature = %feature, log = %log, "Feature compile failed, disabling");
                    state.fail(log, elapsed);
                }
                Err(abort) => {
                    state.requeue();
                    self.queue.push_front(feature);
                    return Err(abort);
                }
            },
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.phase = LoaderPhase::Complete;
        let state = self.state();
        tracing::info!(
            ready = state.ready_features().len(),
            failed = state.failed_features().len(),
            has_basic_rendering = self.has_basic_rendering,
            "Progressive load complete"
        );
    }

    /// Compile log for an expected failure, or the error that aborts the run.
    fn failure_log(err: VariantError) -> Result<String, LoaderError> {
        match err {
            VariantError::Compilation { log, .. } => Ok(log),
            other => Err(LoaderError::from_variant(other).unwrap_or(LoaderError::InvalidSource)),
        }
    }
}

impl Default for ProgressiveLoader {
    fn default() -> Self {
        Self::new()
    }
}
