//! Compilation state types for the progressive loader.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::features::Feature;

/// Compilation status of one optional capability.
///
/// ```text
/// Pending ──► Compiling ──► Succeeded
///    ▲             │
///    └─────────────┼──────► Failed
///   backend lost   │
/// ```
///
/// `Succeeded` and `Failed` are terminal. A compile interrupted by a lost
/// backend goes back to `Pending`: the capability is not at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilationStatus {
    /// Requested, not started.
    #[default]
    Pending,
    /// Handed to the backend.
    Compiling,
    /// Compiled; eligible for the effective feature set.
    Succeeded,
    /// Rejected by the backend; disabled for this run.
    Failed,
}

impl CompilationStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, CompilationStatus::Succeeded | CompilationStatus::Failed)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            CompilationStatus::Pending => "pending",
            CompilationStatus::Compiling => "compiling",
            CompilationStatus::Succeeded => "succeeded",
            CompilationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CompilationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-capability compilation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCompilationState {
    /// Current status.
    pub status: CompilationStatus,
    /// Compiler log when `Failed`.
    pub error: Option<String>,
    /// Backend time once terminal.
    pub duration: Option<Duration>,
}

impl FeatureCompilationState {
    /// Fresh `Pending` record.
    pub fn pending() -> Self {
        Self::default()
    }

    /// `Pending -> Compiling`. Returns `false` if the transition is illegal.
    pub(crate) fn start(&mut self) -> bool {
        if self.status != CompilationStatus::Pending {
            return false;
        }
        self.status = CompilationStatus::Compiling;
        true
    }

    /// `Compiling -> Succeeded`. Returns `false` if the transition is illegal.
    pub(crate) fn succeed(&mut self, duration: Duration) -> bool {
        if self.status != CompilationStatus::Compiling {
            return false;
        }
        self.status = CompilationStatus::Succeeded;
        self.duration = Some(duration);
        true
    }

    /// `Compiling -> Failed`. Returns `false` if the transition is illegal.
    pub(crate) fn fail(&mut self, error: impl Into<String>, duration: Duration) -> bool {
        if self.status != CompilationStatus::Compiling {
            return false;
        }
        self.status = CompilationStatus::Failed;
        self.error = Some(error.into());
        self.duration = Some(duration);
        true
    }

    /// `Compiling -> Pending`. Returns `false` if the transition is illegal.
    pub(crate) fn requeue(&mut self) -> bool {
        if self.status != CompilationStatus::Compiling {
            return false;
        }
        self.status = CompilationStatus::Pending;
        true
    }
}

/// Overall loader lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderPhase {
    /// Nothing requested yet, or reset.
    #[default]
    Idle,
    /// Baseline or capabilities still compiling.
    Initializing,
    /// Every requested capability resolved.
    Complete,
}

impl fmt::Display for LoaderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderPhase::Idle => write!(f, "idle"),
            LoaderPhase::Initializing => write!(f, "initializing"),
            LoaderPhase::Complete => write!(f, "complete"),
        }
    }
}

/// Point-in-time view of the loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderState {
    /// Lifecycle phase.
    pub phase: LoaderPhase,
    /// Records for every requested capability.
    pub features: BTreeMap<Feature, FeatureCompilationState>,
    /// Resolved / requested, in `[0, 1]`.
    pub overall_progress: f64,
    /// Whether every requested capability is resolved.
    pub is_complete: bool,
    /// Whether the baseline program compiled.
    pub has_basic_rendering: bool,
}

impl LoaderState {
    /// Capabilities that ended in `Failed`.
    pub fn failed_features(&self) -> Vec<Feature> {
        self.with_status(CompilationStatus::Failed)
    }

    /// Capabilities that ended in `Succeeded`.
    pub fn ready_features(&self) -> Vec<Feature> {
        self.with_status(CompilationStatus::Succeeded)
    }

    fn with_status(&self, status: CompilationStatus) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|(_, state)| state.status == status)
            .map(|(feature, _)| *feature)
            .collect()
    }
}
