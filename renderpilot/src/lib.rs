//! RenderPilot - Adaptive quality control for interactive simulation renderers
//!
//! This library provides the control structures that decide whether, and at
//! what quality, optional rendering capabilities run. The physics, the scene
//! and the graphics API stay outside; this crate only sees an opaque
//! compilation backend and a per-frame FPS signal.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────┐
//!  startup ────────► │  ProgressiveLoader   │──┐
//!                    └──────────────────────┘  │ get_or_compile
//!                                              ▼
//!  config change ─────────────────────► ┌──────────────┐     ┌────────────────────┐
//!                                       │ VariantCache │ ──► │ CompilationBackend │
//!                                       └──────────────┘     └────────────────────┘
//!
//!                    ┌──────────────────────────────────────────────┐
//!  tick(dt, fps) ──► │ AdaptiveSession                              │
//!                    │  ├─ PerformanceMonitor (RollingStatistics ×4) │
//!                    │  ├─ ResolutionController (dwell hysteresis)  │
//!                    │  ├─ BenchmarkController (preset FSM)         │
//!                    │  └─ IdleTracker                              │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Everything is driven from a single thread of control. Other threads talk
//! to a session through [`session::SessionCommand`] messages.

pub mod backend;
pub mod benchmark;
pub mod clock;
pub mod config;
pub mod features;
pub mod loader;
pub mod logging;
pub mod monitor;
pub mod resolution;
pub mod session;
pub mod util;
pub mod variant_cache;

pub use backend::{BackendError, CompilationBackend, ProgramHandle, SimulatedBackend};
pub use benchmark::{
    BenchmarkConfig, BenchmarkController, BenchmarkError, BenchmarkEvent, BenchmarkPhase,
    BenchmarkReport, BenchmarkResult, QualityPreset, Recommendation,
};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{config_file_path, ConfigFile, ConfigFileError, ConfigKey};
pub use features::{ConfigurationError, Feature, FeatureConfiguration, QualityLevel, VariantKey};
pub use loader::{
    CompilationStatus, FeatureCompilationState, LoaderConfig, LoaderError, LoaderPhase,
    LoaderState, ProgressiveLoader,
};
pub use logging::{init_logging, LoggingConfig, LoggingError, LoggingGuard};
pub use monitor::{
    FrameTimings, MonitorConfig, PerformanceMonitor, PerformanceSnapshot, RollingStatistics,
};
pub use resolution::{ResolutionConfig, ResolutionController, ResolutionState};
pub use session::{AdaptiveSession, FrameDecision, SessionCommand, SessionConfig};
pub use util::{Debouncer, DirtyStateBatcher, IdleTracker, Memoizer};
pub use variant_cache::{CompiledVariant, VariantCache, VariantCacheConfig, VariantError};
