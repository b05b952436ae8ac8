//! The variant cache itself.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::error::VariantError;
use super::source::specialize;
use crate::backend::{BackendError, CompilationBackend, ProgramHandle};
use crate::clock::{SharedClock, SystemClock};
use crate::features::{FeatureConfiguration, VariantKey};

/// Default advisory compile budget.
pub const DEFAULT_COMPILE_BUDGET: Duration = Duration::from_millis(100);

/// Configuration for [`VariantCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCacheConfig {
    /// Compiles slower than this log a warning. Never fails the compile.
    pub compile_budget: Duration,
}

impl Default for VariantCacheConfig {
    fn default() -> Self {
        Self {
            compile_budget: DEFAULT_COMPILE_BUDGET,
        }
    }
}

impl VariantCacheConfig {
    /// Set the compile budget.
    pub fn with_compile_budget(mut self, budget: Duration) -> Self {
        self.compile_budget = budget;
        self
    }
}

/// A compiled program for one configuration.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledVariant {
    /// Canonical key.
    pub key: VariantKey,
    /// Configuration the program was specialized for.
    pub configuration: FeatureConfiguration,
    /// Backend handle. Valid until the owning cache is cleared.
    pub handle: ProgramHandle,
    /// Time spent in the backend compiler.
    pub compile_duration: Duration,
}

/// Counters describing cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariantCacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that went to the backend.
    pub misses: u64,
    /// Successful compiles.
    pub compiles: u64,
    /// Rejected compiles.
    pub failures: u64,
    /// Compiles that exceeded the budget.
    pub budget_overruns: u64,
    /// Variants currently held.
    pub entries: usize,
}

impl VariantCacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache of compiled program variants keyed by configuration fingerprint.
///
/// The cache owns its backend and every handle it produced. Handles are
/// released by [`clear`](Self::clear), or when the cache is dropped.
///
/// One cache serves one base program. Passing a different base source
/// invalidates every variant built from the previous one.
///
/// # Example
///
/// ```
/// use renderpilot::backend::SimulatedBackend;
/// use renderpilot::features::{Feature, FeatureConfiguration, QualityLevel};
/// use renderpilot::variant_cache::VariantCache;
/// use std::sync::Arc;
///
/// let mut cache = VariantCache::new(SimulatedBackend::new());
/// let config = FeatureConfiguration::new(QualityLevel::High).with(Feature::Lensing);
///
/// let first = cache.get_or_compile("void main() {}", &config).unwrap();
/// let second = cache.get_or_compile("void main() {}", &config).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.stats().compiles, 1);
/// ```
pub struct VariantCache<B: CompilationBackend> {
    backend: B,
    clock: SharedClock,
    config: VariantCacheConfig,
    entries: HashMap<VariantKey, Arc<CompiledVariant>>,
    failures: HashMap<VariantKey, String>,
    source_fingerprint: Option<u64>,
    stats: VariantCacheStats,
}

impl<B: CompilationBackend> std::fmt::Debug for VariantCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantCache")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<B: CompilationBackend> VariantCache<B> {
    /// Create a cache with default configuration and the system clock.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, VariantCacheConfig::default(), SystemClock::shared())
    }

    /// Create a cache with explicit configuration and clock.
    pub fn with_config(backend: B, config: VariantCacheConfig, clock: SharedClock) -> Self {
        Self {
            backend,
            clock,
            config,
            entries: HashMap::new(),
            failures: HashMap::new(),
            source_fingerprint: None,
            stats: VariantCacheStats::default(),
        }
    }

    /// Return the cached variant for `config`, compiling it on a miss.
    ///
    /// Structurally equal configurations always map to the same
    /// `Arc<CompiledVariant>`. A rejected compile stores nothing, so asking
    /// again retries the backend.
    pub fn get_or_compile(
        &mut self,
        base_source: &str,
        config: &FeatureConfiguration,
    ) -> Result<Arc<CompiledVariant>, VariantError> {
        if base_source.trim().is_empty() {
            return Err(VariantError::InvalidSource);
        }
        self.track_base_source(base_source)?;

        let key = config.key();
        if let Some(variant) = self.entries.get(&key) {
            self.stats.hits += 1;
            tracing::trace!(key = %key, "Variant cache hit");
            return Ok(Arc::clone(variant));
        }
        self.stats.misses += 1;

        let source = specialize(base_source, config);
        let started = self.clock.now();
        let result = self.backend.compile(&source);
        let compile_duration = self.clock.now().saturating_duration_since(started);

        if compile_duration > self.config.compile_budget {
            self.stats.budget_overruns += 1;
            tracing::warn!(
                key = %key,
                configuration = %config,
                compile_ms = compile_duration.as_millis(),
                budget_ms = self.config.compile_budget.as_millis(),
                "Variant compile exceeded time budget"
            );
        }

        match result {
            Ok(handle) => {
                self.stats.compiles += 1;
                self.failures.remove(&key);
                let variant = Arc::new(CompiledVariant {
                    key,
                    configuration: *config,
                    handle,
                    compile_duration,
                });
                self.entries.insert(key, Arc::clone(&variant));
                self.stats.entries = self.entries.len();
                tracing::debug!(
                    key = %key,
                    configuration = %config,
                    handle = %handle,
                    compile_ms = compile_duration.as_millis(),
                    "Variant compiled"
                );
                Ok(variant)
            }
            Err(BackendError::Rejected { log }) => {
                self.stats.failures += 1;
                tracing::warn!(
                    key = %key,
                    configuration = %config,
                    log = %log,
                    "Variant compile failed"
                );
                self.failures.insert(key, log.clone());
                Err(VariantError::Compilation {
                    key,
                    configuration: *config,
                    log,
                })
            }
            Err(err) => {
                tracing::error!(key = %key, error = %err, "Compilation backend lost");
                Err(VariantError::BackendLost(err))
            }
        }
    }

    /// Whether a variant for `config` is cached.
    pub fn contains(&self, config: &FeatureConfiguration) -> bool {
        self.entries.contains_key(&config.key())
    }

    /// Most recent compiler log for a configuration that failed and has not
    /// compiled successfully since.
    pub fn last_failure(&self, config: &FeatureConfiguration) -> Option<&str> {
        self.failures.get(&config.key()).map(String::as_str)
    }

    /// Number of cached variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no variants.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache counters.
    pub fn stats(&self) -> VariantCacheStats {
        self.stats
    }

    /// Borrow the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release every cached handle and empty the cache.
    ///
    /// All handles are released even if some releases fail; the first
    /// failure is returned afterwards.
    pub fn clear(&mut self) -> Result<(), VariantError> {
        let released = self.entries.len();
        let mut first_error = None;

        for (key, variant) in self.entries.drain() {
            if let Err(err) = self.backend.release(variant.handle) {
                tracing::error!(key = %key, handle = %variant.handle, error = %err, "Failed to release variant");
                first_error.get_or_insert(err);
            }
        }
        self.failures.clear();
        self.source_fingerprint = None;
        self.stats.entries = 0;

        tracing::debug!(released, "Variant cache cleared");

        match first_error {
            Some(err) => Err(VariantError::BackendLost(err)),
            None => Ok(()),
        }
    }

    fn track_base_source(&mut self, base_source: &str) -> Result<(), VariantError> {
        let mut hasher = DefaultHasher::new();
        base_source.hash(&mut hasher);
        let fingerprint = hasher.finish();

        match self.source_fingerprint {
            Some(current) if current == fingerprint => Ok(()),
            Some(_) => {
                tracing::info!(
                    variants = self.entries.len(),
                    "Base source changed, invalidating cached variants"
                );
                self.clear()?;
                self.source_fingerprint = Some(fingerprint);
                Ok(())
            }
            None => {
                self.source_fingerprint = Some(fingerprint);
                Ok(())
            }
        }
    }
}

impl<B: CompilationBackend> Drop for VariantCache<B> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            if let Err(err) = self.clear() {
                tracing::warn!(error = %err, "Variant cache dropped with unreleasable handles");
            }
        }
    }
}
