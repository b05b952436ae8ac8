//! Progressive capability loading.
//!
//! Brings the renderer to an interactive state quickly: a minimal baseline
//! program is compiled first, then each requested optional capability is
//! compiled on its own. A capability that fails to build is disabled and
//! logged; it never blocks the others.
//!
//! # Loader Flow
//!
//! ```text
//! begin(requested) ──► Initializing
//!        │
//!        ▼
//!   step: baseline (all off, low quality) ──ok──► has_basic_rendering
//!        │
//!        ▼
//!   step: lensing only ──► Succeeded | Failed
//!   step: bloom only   ──► Succeeded | Failed
//!        │                      ...
//!        ▼
//!     Complete
//! ```
//!
//! Compilation is serial. Hosts that cannot afford the whole batch in one
//! frame call [`ProgressiveLoader::step`] once per frame instead of
//! [`ProgressiveLoader::initialize`].

mod error;
mod progressive;
mod state;

pub use error::LoaderError;
pub use progressive::{LoaderConfig, ProgressiveLoader, DEFAULT_BASELINE_BUDGET};
pub use state::{CompilationStatus, FeatureCompilationState, LoaderPhase, LoaderState};
