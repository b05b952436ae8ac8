//! `load`: progressive startup compile on the simulated backend.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use renderpilot::variant_cache::VariantCacheStats;
use renderpilot::{
    ConfigFile, Feature, FeatureConfiguration, LoaderPhase, LoaderState, ManualClock,
    ProgressiveLoader, QualityLevel, SimulatedBackend, VariantCache,
};
use serde::Serialize;

use super::common::{progress_bar, resolve_requested};
use crate::error::CliError;

/// Program compiled when no `--source` is given.
const DEMO_SOURCE: &str = "\
#version 300 es
precision highp float;
out vec4 color;
void main() {
    color = vec4(0.0, 0.0, 0.0, 1.0);
}
";

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Capabilities to request, comma separated (overrides loader.features)
    #[arg(long, value_delimiter = ',')]
    pub features: Option<Vec<Feature>>,

    /// Quality level to request (overrides loader.quality)
    #[arg(long)]
    pub quality: Option<QualityLevel>,

    /// Make the backend reject this capability; repeatable
    #[arg(long)]
    pub fail: Vec<Feature>,

    /// Program source to specialize (defaults to a built-in stub)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Simulated milliseconds per compile
    #[arg(long, default_value_t = 0)]
    pub compile_ms: u64,

    /// Extra simulated milliseconds per enabled flag in a compile
    #[arg(long, default_value_t = 0)]
    pub flag_ms: u64,

    /// Print the outcome as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// What a load run produced.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub requested: FeatureConfiguration,
    pub effective: FeatureConfiguration,
    pub baseline_error: Option<String>,
    pub state: LoaderState,
    pub cache: VariantCacheStats,
}

/// Run the load command.
pub fn run(args: LoadArgs, config: &ConfigFile) -> Result<(), CliError> {
    let requested = resolve_requested(config, args.features.clone(), args.quality)?;
    let source = match &args.source {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })?,
        None => DEMO_SOURCE.to_string(),
    };

    let outcome = load(&args, config, requested, &source)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn load(
    args: &LoadArgs,
    config: &ConfigFile,
    requested: FeatureConfiguration,
    source: &str,
) -> Result<LoadOutcome, CliError> {
    let clock = ManualClock::shared();
    let backend = args.fail.iter().fold(
        SimulatedBackend::new().with_compile_cost(
            clock.clone(),
            Duration::from_millis(args.compile_ms),
            Duration::from_millis(args.flag_ms),
        ),
        |backend, feature| backend.with_failing_define(feature.define_name()),
    );
    let mut cache = VariantCache::with_config(backend, config.variants.clone(), clock.clone());
    let mut loader = ProgressiveLoader::with_config(config.loader.clone(), clock.clone());

    loader.begin(&requested, source)?;
    let progress = progress_bar(100, args.json);
    while loader.step(&mut cache)? == LoaderPhase::Initializing {
        progress.set_position((loader.state().overall_progress * 100.0) as u64);
    }
    progress.finish_and_clear();

    Ok(LoadOutcome {
        requested,
        effective: loader.enabled_features(&requested),
        baseline_error: loader.baseline_error().map(str::to_string),
        state: loader.state(),
        cache: cache.stats(),
    })
}

fn print_outcome(outcome: &LoadOutcome) {
    println!("Progressive Load");
    println!("================");
    println!();
    println!("Requested: {}", outcome.requested);
    match &outcome.baseline_error {
        None => println!("Baseline:  ready"),
        Some(log) => println!("Baseline:  FAILED ({})", log),
    }
    println!();

    for (feature, record) in &outcome.state.features {
        let duration = record
            .duration
            .map(|d| format!("{:.1} ms", d.as_secs_f64() * 1000.0))
            .unwrap_or_default();
        println!("  {:<24} {:<10} {:>10}", feature.name(), record.status.as_str(), duration);
        if let Some(error) = &record.error {
            println!("      {}", error);
        }
    }
    println!();
    println!("Effective: {}", outcome.effective);
    println!(
        "Cache: {} programs, {} compiles, {} failures",
        outcome.cache.entries, outcome.cache.compiles, outcome.cache.failures
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(fail: Vec<Feature>) -> LoadArgs {
        LoadArgs {
            features: None,
            quality: None,
            fail,
            source: None,
            compile_ms: 40,
            flag_ms: 10,
            json: true,
        }
    }

    #[test]
    fn test_failed_capability_excluded() {
        let config = ConfigFile::default();
        let outcome = load(
            &args(vec![Feature::Bloom]),
            &config,
            config.requested,
            DEMO_SOURCE,
        )
        .unwrap();

        assert!(outcome.state.is_complete);
        assert_eq!(outcome.state.failed_features(), vec![Feature::Bloom]);
        assert_eq!(outcome.effective, config.requested.without(Feature::Bloom));
        assert_eq!(outcome.baseline_error, None);
        assert_eq!(outcome.cache.failures, 1);
    }

    #[test]
    fn test_simulated_durations_recorded() {
        let config = ConfigFile::default();
        let requested = FeatureConfiguration::new(QualityLevel::Low).with(Feature::Lensing);
        let outcome = load(&args(Vec::new()), &config, requested, DEMO_SOURCE).unwrap();

        let record = &outcome.state.features[&Feature::Lensing];
        // Base cost plus the lensing flag and the one-hot quality flag.
        assert_eq!(record.duration, Some(Duration::from_millis(60)));
    }

    #[test]
    fn test_huge_simulated_cost_does_not_overflow() {
        let config = ConfigFile::default();
        let args = LoadArgs {
            compile_ms: u64::MAX,
            flag_ms: u64::MAX,
            ..args(Vec::new())
        };
        let outcome = load(&args, &config, config.requested, DEMO_SOURCE).unwrap();

        assert!(outcome.state.is_complete);
        assert_eq!(outcome.effective, config.requested);
        assert!(outcome.cache.budget_overruns > 0);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let config = ConfigFile::default();
        let err = load(&args(Vec::new()), &config, config.requested, "  ").unwrap_err();
        assert!(matches!(err, CliError::Loader(_)));
    }

    #[test]
    fn test_outcome_serializes() {
        let config = ConfigFile::default();
        let outcome = load(&args(Vec::new()), &config, config.requested, DEMO_SOURCE).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["state"]["phase"], "complete");
        assert_eq!(json["state"]["is_complete"], true);
    }
}
