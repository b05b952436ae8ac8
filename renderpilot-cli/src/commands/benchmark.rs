//! `benchmark`: run the preset ladder against the modeled GPU.

use std::time::Duration;

use clap::Args;
use renderpilot::{
    BenchmarkConfig, BenchmarkController, BenchmarkEvent, BenchmarkReport, ConfigFile, ManualClock,
};

use super::common::{progress_bar, GpuModel, DEFAULT_BASE_FPS};
use crate::error::CliError;

/// Progress bar resolution.
const PROGRESS_STEPS: u64 = 1000;

#[derive(Debug, Args)]
pub struct BenchmarkArgs {
    /// Seconds to measure each preset (overrides benchmark.test_duration_secs)
    #[arg(long)]
    pub duration: Option<f64>,

    /// FPS the modeled GPU reaches on the cheapest frame
    #[arg(long, default_value_t = DEFAULT_BASE_FPS)]
    pub base_fps: f64,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run the benchmark command.
pub fn run(args: BenchmarkArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut benchmark = config.benchmark.clone();
    if let Some(secs) = args.duration {
        benchmark = benchmark.with_test_duration(preset_duration(secs)?);
    }

    let mut gpu = GpuModel::new(args.base_fps)?;
    let report = run_ladder(&mut gpu, config, benchmark, !args.json)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Per-preset measurement time from `--duration`.
fn preset_duration(secs: f64) -> Result<Duration, CliError> {
    let invalid = |reason: String| {
        CliError::Config(format!(
            "Duration must be a positive number of seconds, got {} ({})",
            secs, reason
        ))
    };
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid("not positive".to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(e.to_string()))
}

/// Drive a controller on simulated time until the run completes.
fn run_ladder(
    gpu: &mut GpuModel,
    config: &ConfigFile,
    benchmark: BenchmarkConfig,
    show_progress: bool,
) -> Result<BenchmarkReport, CliError> {
    let clock = ManualClock::shared();
    let mut controller = BenchmarkController::with_clock(benchmark, clock.clone())?;
    let mut active = controller.start(config.requested)?.clone();

    let progress = progress_bar(PROGRESS_STEPS, !show_progress);
    progress.set_message(active.name.clone());

    let report = loop {
        let fps = gpu.frame_fps(&active.configuration, active.resolution_scale);
        clock.advance_secs(1.0 / fps);

        match controller.update(fps) {
            Some(BenchmarkEvent::PresetStarted { preset, .. }) => {
                progress.set_message(preset.name.clone());
                active = preset;
            }
            Some(BenchmarkEvent::Completed { report, .. }) => break report,
            None => {}
        }
        progress.set_position((controller.overall_progress() * PROGRESS_STEPS as f64) as u64);
    };
    progress.finish_and_clear();

    tracing::debug!(
        configurations = gpu.modeled_configurations(),
        simulated_secs = clock.elapsed().as_secs_f64(),
        "Benchmark simulation finished"
    );
    Ok(report)
}

fn print_report(report: &BenchmarkReport) {
    println!("Benchmark Results");
    println!("=================");
    println!();
    println!(
        "  {:<10} {:>9} {:>9} {:>9} {:>10} {:>8}",
        "preset", "avg fps", "min fps", "max fps", "frame ms", "samples"
    );
    for result in &report.results {
        println!(
            "  {:<10} {:>9.1} {:>9.1} {:>9.1} {:>10.2} {:>8}",
            result.preset_name,
            result.average_fps,
            result.min_fps,
            result.max_fps,
            result.average_frame_time_ms,
            result.samples
        );
    }
    println!();

    let recommendation = &report.recommendation;
    match recommendation.tier_fps {
        Some(tier) => println!(
            "Recommended preset: {} ({:.1} FPS, meets the {} FPS tier)",
            recommendation.preset_name, recommendation.average_fps, tier
        ),
        None => println!(
            "Recommended preset: {} ({:.1} FPS, no preset met any tier)",
            recommendation.preset_name, recommendation.average_fps
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_argument_validated() {
        assert_eq!(preset_duration(1.5).unwrap(), Duration::from_millis(1500));
        assert!(matches!(preset_duration(0.0), Err(CliError::Config(_))));
        assert!(matches!(preset_duration(f64::NAN), Err(CliError::Config(_))));
        assert!(matches!(preset_duration(1e30), Err(CliError::Config(_))));
    }

    #[test]
    fn test_ladder_recommends_medium_on_default_model() {
        let config = ConfigFile::default();
        let benchmark = BenchmarkConfig::default().with_test_duration(Duration::from_millis(500));
        let mut gpu = GpuModel::new(DEFAULT_BASE_FPS).unwrap();

        let report = run_ladder(&mut gpu, &config, benchmark, false).unwrap();

        assert_eq!(report.results.len(), 4);
        assert_eq!(report.recommendation.preset_name, "medium");
        assert_eq!(report.recommendation.tier_fps, Some(60.0));
        assert_eq!(gpu.modeled_configurations(), 4);
    }

    #[test]
    fn test_slow_gpu_falls_to_lower_tier() {
        let config = ConfigFile::default();
        let benchmark = config
            .benchmark
            .clone()
            .with_test_duration(Duration::from_millis(500));
        let mut gpu = GpuModel::new(60.0).unwrap();

        let report = run_ladder(&mut gpu, &config, benchmark, false).unwrap();

        assert!(report
            .results
            .iter()
            .all(|r| r.average_fps < 60.0 || r.preset_name == "low"));
        assert!(report.recommendation.tier_fps.is_some());
    }
}
