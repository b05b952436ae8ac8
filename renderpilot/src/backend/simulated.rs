//! In-process stand-in for a graphics compiler.
//!
//! `SimulatedBackend` accepts any non-empty source, hands out sequential
//! program handles and tracks which are still alive. It can be told to
//! reject sources that enable particular flags, to charge compile time
//! against a [`ManualClock`], or to lose its context. The CLI uses it to
//! demonstrate loader and cache behavior; tests use it to script failures.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::{BackendError, CompilationBackend, ProgramHandle};
use crate::clock::ManualClock;

/// Simulated compile cost charged to a manual clock.
#[derive(Debug, Clone)]
struct CompileCost {
    clock: Arc<ManualClock>,
    base: Duration,
    per_enabled_flag: Duration,
}

/// Scriptable in-process compilation backend.
#[derive(Debug, Default)]
pub struct SimulatedBackend {
    next_handle: u64,
    live: HashSet<ProgramHandle>,
    failing_defines: Vec<String>,
    cost: Option<CompileCost>,
    context_lost: bool,
    compile_calls: usize,
    release_calls: usize,
}

impl SimulatedBackend {
    /// Backend that compiles everything instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any source that sets `define` to 1.
    pub fn with_failing_define(mut self, define: impl Into<String>) -> Self {
        self.failing_defines.push(define.into());
        self
    }

    /// Advance `clock` on every compile by `base` plus `per_enabled_flag` for
    /// each `#define ... 1` line in the source.
    pub fn with_compile_cost(
        mut self,
        clock: Arc<ManualClock>,
        base: Duration,
        per_enabled_flag: Duration,
    ) -> Self {
        self.cost = Some(CompileCost {
            clock,
            base,
            per_enabled_flag,
        });
        self
    }

    /// Invalidate the context: every later call fails with `ContextLost`.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    /// Number of `compile` calls so far, successful or not.
    pub fn compile_calls(&self) -> usize {
        self.compile_calls
    }

    /// Number of `release` calls so far.
    pub fn release_calls(&self) -> usize {
        self.release_calls
    }

    /// Programs compiled and not yet released.
    pub fn live_programs(&self) -> usize {
        self.live.len()
    }

    fn enabled_defines(source: &str) -> impl Iterator<Item = &str> {
        source.lines().filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some("#define"), Some(name), Some("1")) => Some(name),
                _ => None,
            }
        })
    }
}

impl CompilationBackend for SimulatedBackend {
    fn compile(&mut self, source: &str) -> Result<ProgramHandle, BackendError> {
        self.compile_calls += 1;

        if self.context_lost {
            return Err(BackendError::ContextLost("simulated context loss".to_string()));
        }

        if let Some(cost) = &self.cost {
            let flags = u32::try_from(Self::enabled_defines(source).count()).unwrap_or(u32::MAX);
            let per_flags = cost.per_enabled_flag.saturating_mul(flags);
            cost.clock.advance(cost.base.saturating_add(per_flags));
        }

        if source.trim().is_empty() {
            return Err(BackendError::Rejected {
                log: "ERROR: 0:0: empty translation unit".to_string(),
            });
        }

        if let Some((line_no, define)) = source.lines().enumerate().find_map(|(i, line)| {
            Self::enabled_defines(line)
                .find(|name| self.failing_defines.iter().any(|f| f == name))
                .map(|name| (i + 1, name.to_string()))
        }) {
            return Err(BackendError::Rejected {
                log: format!(
                    "ERROR: 0:{}: '{}' : required extension not supported",
                    line_no, define
                ),
            });
        }

        self.next_handle += 1;
        let handle = ProgramHandle::new(self.next_handle);
        self.live.insert(handle);
        Ok(handle)
    }

    fn release(&mut self, handle: ProgramHandle) -> Result<(), BackendError> {
        self.release_calls += 1;

        if self.context_lost {
            return Err(BackendError::ContextLost("simulated context loss".to_string()));
        }

        if self.live.remove(&handle) {
            Ok(())
        } else {
            Err(BackendError::InvalidHandle(handle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    #[test]
    fn test_compile_and_release() {
        let mut backend = SimulatedBackend::new();
        let a = backend.compile("void main() {}").unwrap();
        let b = backend.compile("void main() {}").unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.live_programs(), 2);

        backend.release(a).unwrap();
        assert_eq!(backend.live_programs(), 1);
        assert_eq!(backend.release(a), Err(BackendError::InvalidHandle(a)));
    }

    #[test]
    fn test_empty_source_rejected() {
        let mut backend = SimulatedBackend::new();
        let err = backend.compile("   \n").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn test_failing_define_only_when_enabled() {
        let mut backend = SimulatedBackend::new().with_failing_define("ENABLE_BLOOM");

        assert!(backend.compile("#define ENABLE_BLOOM 0\nvoid main() {}").is_ok());

        let err = backend
            .compile("#version 300 es\n#define ENABLE_BLOOM 1\nvoid main() {}")
            .unwrap_err();
        match err {
            BackendError::Rejected { log } => {
                assert!(log.contains("0:2"), "log: {}", log);
                assert!(log.contains("ENABLE_BLOOM"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_compile_cost_advances_clock() {
        let clock = ManualClock::shared();
        let start = clock.now();
        let mut backend = SimulatedBackend::new().with_compile_cost(
            Arc::clone(&clock),
            Duration::from_millis(10),
            Duration::from_millis(5),
        );

        backend
            .compile("#define A 1\n#define B 1\n#define C 0\nvoid main() {}")
            .unwrap();
        assert_eq!(clock.now() - start, Duration::from_millis(20));
    }

    #[test]
    fn test_huge_compile_cost_saturates() {
        let clock = ManualClock::shared();
        let mut backend = SimulatedBackend::new().with_compile_cost(
            Arc::clone(&clock),
            Duration::MAX,
            Duration::MAX,
        );

        backend.compile("#define A 1
void main() {}").unwrap();
        backend.compile("#define A 1
void main() {}").unwrap();
        assert_eq!(clock.elapsed(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn test_context_loss() {
        let mut backend = SimulatedBackend::new();
        let handle = backend.compile("void main() {}").unwrap();
        backend.lose_context();

        assert!(matches!(
            backend.compile("void main() {}"),
            Err(BackendError::ContextLost(_))
        ));
        assert!(matches!(
            backend.release(handle),
            Err(BackendError::ContextLost(_))
        ));
        assert_eq!(backend.compile_calls(), 2);
        assert_eq!(backend.release_calls(), 1);
    }
}
