//! Integration tests for progressive loading on top of the variant cache.
//!
//! These tests drive the public API the way a host renderer does:
//! - build a cache over a backend
//! - run the loader for the requested configuration
//! - render with whatever the loader reports as enabled
//!
//! Run with: `cargo test --test loader_integration`

use std::sync::Arc;
use std::time::Duration;

use renderpilot::{
    CompilationBackend, CompilationStatus, Feature, FeatureConfiguration, LoaderConfig,
    LoaderPhase, ManualClock, ProgressiveLoader, QualityLevel, SimulatedBackend, VariantCache,
    VariantCacheConfig,
};

// ============================================================================
// Helper Functions
// ============================================================================

const BASE_SOURCE: &str = "#version 300 es\nvoid main() { gl_FragColor = vec4(0.0); }\n";

/// Cache and loader sharing one manual clock.
fn pipeline(
    backend: SimulatedBackend,
    clock: &Arc<ManualClock>,
) -> (VariantCache<SimulatedBackend>, ProgressiveLoader) {
    let cache = VariantCache::with_config(
        backend,
        VariantCacheConfig::default(),
        clock.clone(),
    );
    let loader = ProgressiveLoader::with_config(LoaderConfig::default(), clock.clone());
    (cache, loader)
}

// ============================================================================
// Integration Tests
// ============================================================================

/// One capability refuses to compile; everything else is usable and the
/// effective configuration can be compiled straight away.
#[test]
fn test_failed_capability_is_dropped_from_effective_configuration() {
    let clock = ManualClock::shared();
    let backend = SimulatedBackend::new().with_failing_define("ENABLE_DOPPLER_BEAMING");
    let (mut cache, mut loader) = pipeline(backend, &clock);
    let requested = FeatureConfiguration::all(QualityLevel::High);

    let state = loader.initialize(&mut cache, &requested, BASE_SOURCE).unwrap();

    assert!(state.is_complete);
    assert!(state.has_basic_rendering);
    assert_eq!(state.failed_features(), vec![Feature::DopplerBeaming]);

    let effective = loader.enabled_features(&requested);
    for feature in Feature::ALL {
        assert_eq!(
            effective.is_enabled(feature),
            feature != Feature::DopplerBeaming,
            "{feature}"
        );
        assert_eq!(
            loader.is_feature_failed(feature),
            feature == Feature::DopplerBeaming,
            "{feature}"
        );
    }
    assert_eq!(effective.quality(), QualityLevel::High);
    assert!(loader
        .feature_error(Feature::DopplerBeaming)
        .is_some_and(|log| log.contains("ENABLE_DOPPLER_BEAMING")));

    let program = cache.get_or_compile(BASE_SOURCE, &effective).unwrap();
    assert_eq!(program.configuration, effective);
}

/// The host keeps rendering between steps: basic rendering is available as
/// soon as the first step returns.
#[test]
fn test_incremental_loading_reports_progress() {
    let clock = ManualClock::shared();
    let backend = SimulatedBackend::new().with_compile_cost(
        clock.clone(),
        Duration::from_millis(20),
        Duration::from_millis(5),
    );
    let (mut cache, mut loader) = pipeline(backend, &clock);
    let requested = FeatureConfiguration::new(QualityLevel::Medium)
        .with(Feature::Lensing)
        .with(Feature::Bloom);

    loader.begin(&requested, BASE_SOURCE).unwrap();
    assert_eq!(loader.state().overall_progress, 0.0);

    assert_eq!(loader.step(&mut cache).unwrap(), LoaderPhase::Initializing);
    assert!(loader.has_basic_rendering());
    assert!(!loader.is_feature_ready(Feature::Lensing));

    let mut frames = 1;
    while loader.step(&mut cache).unwrap() == LoaderPhase::Initializing {
        frames += 1;
        let progress = loader.state().overall_progress;
        assert!((0.0..=1.0).contains(&progress));
    }

    assert_eq!(frames, 2);
    let state = loader.state();
    assert_eq!(state.overall_progress, 1.0);
    for record in state.features.values() {
        assert_eq!(record.status, CompilationStatus::Succeeded);
        assert!(record.duration.is_some_and(|d| d >= Duration::from_millis(20)));
    }
}

/// Editing the base source invalidates every compiled variant and releases
/// its handle.
#[test]
fn test_source_change_releases_previous_variants() {
    let clock = ManualClock::shared();
    let (mut cache, mut loader) = pipeline(SimulatedBackend::new(), &clock);
    let requested = FeatureConfiguration::new(QualityLevel::Low)
        .with(Feature::Lensing)
        .with(Feature::Starfield);

    loader.initialize(&mut cache, &requested, BASE_SOURCE).unwrap();
    // Baseline plus one variant per capability.
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.backend().live_programs(), 3);

    let edited = format!("{BASE_SOURCE}// tweak\n");
    loader.initialize(&mut cache, &requested, &edited).unwrap();
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.backend().live_programs(), 3);
    assert_eq!(cache.backend().release_calls(), 3);
    assert_eq!(cache.stats().compiles, 6);

    cache.clear().unwrap();
    assert_eq!(cache.backend().live_programs(), 0);
}

/// Equal configurations share one compiled program; distinct ones do not.
#[test]
fn test_cache_identity_across_loader_runs() {
    let clock = ManualClock::shared();
    let (mut cache, mut loader) = pipeline(SimulatedBackend::new(), &clock);
    let requested = FeatureConfiguration::new(QualityLevel::Ultra).with(Feature::AccretionDisk);

    loader.initialize(&mut cache, &requested, BASE_SOURCE).unwrap();
    let compiles = cache.backend().compile_calls();

    let baseline = FeatureConfiguration::baseline();
    let first = cache.get_or_compile(BASE_SOURCE, &baseline).unwrap();
    let second = cache.get_or_compile(BASE_SOURCE, &baseline).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.backend().compile_calls(), compiles);

    let other = cache
        .get_or_compile(BASE_SOURCE, &baseline.with(Feature::Bloom))
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_ne!(first.handle, other.handle);
}

/// A lost context aborts the run instead of marking capabilities failed.
#[test]
fn test_context_loss_mid_run() {
    let clock = ManualClock::shared();
    let (mut cache, mut loader) = pipeline(SimulatedBackend::new(), &clock);
    let requested = FeatureConfiguration::all(QualityLevel::Low);

    loader.begin(&requested, BASE_SOURCE).unwrap();
    loader.step(&mut cache).unwrap();
    cache.backend_mut().lose_context();

    assert!(loader.step(&mut cache).is_err());
    assert!(cache.backend_mut().compile("void main() {}").is_err());

    // The interrupted capability is back in the queue, not blamed.
    let state = loader.state();
    assert!(state.failed_features().is_empty());
    assert!(state
        .features
        .values()
        .all(|record| record.status == CompilationStatus::Pending && record.error.is_none()));
    assert!(!state.is_complete);

    loader.reset();
    assert_eq!(loader.phase(), LoaderPhase::Idle);
    assert!(!loader.has_basic_rendering());
}
