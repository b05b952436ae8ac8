//! Automated quality benchmark.
//!
//! Runs each quality preset for a fixed time while the host renders, then
//! recommends the best preset that holds a tiered frame-rate target.
//!
//! # State Machine
//!
//! ```text
//!            start(current)
//!   Idle ──────────────────► Running ──── preset list exhausted ───► Completed
//!    ▲                        │    ▲                                     │
//!    │                cancel()│    └─ preset elapsed > test_duration:    │
//!    │                        ▼       finalize result, next preset       │
//!    └──────── reset() ── Cancelled ◄────────────────────────────────────┘
//!                                     (start() from either restarts)
//! ```
//!
//! # Recommendation
//!
//! Presets are ordered from lowest to highest quality. For each tier in
//! order (60, 35, 24 FPS by default) the presets are scanned from highest
//! quality down; the first whose average FPS meets the tier wins. If none
//! does, the lowest-quality preset is recommended.
//!
//! The controller never applies presets itself. It reports which preset to
//! apply through [`BenchmarkEvent`] and hands back the configuration that
//! was active before the run, so the caller can restore it.

mod controller;
mod preset;
mod report;

pub use controller::{
    BenchmarkConfig, BenchmarkController, BenchmarkError, BenchmarkEvent, BenchmarkPhase,
    DEFAULT_TEST_DURATION, DEFAULT_TIERS,
};
pub use preset::QualityPreset;
pub use report::{recommend, BenchmarkReport, BenchmarkResult, Recommendation};
