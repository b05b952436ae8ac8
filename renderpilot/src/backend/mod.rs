//! Compilation backend abstraction.
//!
//! The graphics backend is an opaque service that turns specialized program
//! source into an executable artifact. This module defines the narrow
//! interface the variant cache depends on, following the Dependency
//! Inversion Principle: the cache never knows which graphics API sits
//! underneath.
//!
//! # Error classes
//!
//! | Variant | Class | Handling |
//! |---------|-------|----------|
//! | `Rejected` | expected | variant unavailable, log retained |
//! | `ContextLost` | unexpected | surfaced to the caller, reinitialize |
//! | `InvalidHandle` | unexpected | surfaced to the caller, reinitialize |

mod simulated;

pub use simulated::SimulatedBackend;

use std::fmt;

use thiserror::Error;

/// Backend-owned handle to a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(u64);

impl ProgramHandle {
    /// Wrap a raw backend id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw backend id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// Errors reported by a compilation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The source failed to compile or link. Expected and recoverable.
    #[error("Compilation rejected: {log}")]
    Rejected { log: String },

    /// The backend context was invalidated; no handle is usable anymore.
    #[error("Backend context lost: {0}")]
    ContextLost(String),

    /// A handle was used that the backend does not own.
    #[error("Invalid program handle {0}")]
    InvalidHandle(ProgramHandle),
}

impl BackendError {
    /// Whether this error belongs to the expected, locally recoverable class.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BackendError::Rejected { .. })
    }
}

/// The external compilation service.
///
/// Calls are synchronous and blocking. Implementations are driven from a
/// single thread; no `Sync` bound is required.
pub trait CompilationBackend {
    /// Compile fully specialized source into a program.
    fn compile(&mut self, source: &str) -> Result<ProgramHandle, BackendError>;

    /// Release a program previously returned by [`compile`](Self::compile).
    fn release(&mut self, handle: ProgramHandle) -> Result<(), BackendError>;
}

impl<B: CompilationBackend + ?Sized> CompilationBackend for Box<B> {
    fn compile(&mut self, source: &str) -> Result<ProgramHandle, BackendError> {
        (**self).compile(source)
    }

    fn release(&mut self, handle: ProgramHandle) -> Result<(), BackendError> {
        (**self).release(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_classes() {
        assert!(BackendError::Rejected {
            log: "syntax".to_string()
        }
        .is_recoverable());
        assert!(!BackendError::ContextLost("device removed".to_string()).is_recoverable());
        assert!(!BackendError::InvalidHandle(ProgramHandle::new(3)).is_recoverable());
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::InvalidHandle(ProgramHandle::new(7));
        assert_eq!(err.to_string(), "Invalid program handle program#7");
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let mut backend: Box<dyn CompilationBackend> = Box::new(SimulatedBackend::new());
        let handle = backend.compile("void main() {}").unwrap();
        assert!(backend.release(handle).is_ok());
    }
}
