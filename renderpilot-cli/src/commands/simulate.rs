//! `simulate`: run an adaptive session against the modeled GPU.
//!
//! Prints a line whenever the render scale, the active configuration, the
//! benchmark phase or the idle flag changes. A load spike can be injected
//! to watch the resolution loop react and recover.

use std::cell::Cell;

use clap::Args;
use renderpilot::{
    AdaptiveSession, ConfigFile, DirtyStateBatcher, FrameTimings, ManualClock, SessionCommand,
};

use super::common::{GpuModel, DEFAULT_BASE_FPS};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0)]
    pub seconds: f64,

    /// FPS the modeled GPU reaches on the cheapest frame
    #[arg(long, default_value_t = DEFAULT_BASE_FPS)]
    pub base_fps: f64,

    /// Second at which a heavy scene starts
    #[arg(long)]
    pub spike_at: Option<f64>,

    /// Length of the heavy scene in seconds
    #[arg(long, default_value_t = 10.0)]
    pub spike_secs: f64,

    /// How many times slower frames render during the heavy scene
    #[arg(long, default_value_t = 3.0)]
    pub spike_factor: f64,

    /// Start a benchmark on the first frame
    #[arg(long)]
    pub benchmark: bool,
}

/// Totals reported after a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSummary {
    pub frames: u64,
    pub changes: u64,
    pub suppressed: u64,
    pub final_scale: f64,
    pub average_fps: Option<f64>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    validate(&args)?;
    let summary = simulate(&args, config, |secs, name, value| {
        println!("{:>9.2}s  {:<14} {}", secs, name, value);
    })?;

    println!();
    println!(
        "{} frames, {} changes reported, {} unchanged writes skipped",
        summary.frames, summary.changes, summary.suppressed
    );
    println!("Final render scale: {:.2}", summary.final_scale);
    if let Some(fps) = summary.average_fps {
        println!("Average FPS over the last window: {:.1}", fps);
    }
    Ok(())
}

fn validate(args: &SimulateArgs) -> Result<(), CliError> {
    let positive = [
        ("--seconds", args.seconds),
        ("--spike-secs", args.spike_secs),
        ("--spike-factor", args.spike_factor),
    ];
    if let Some((flag, value)) = positive
        .into_iter()
        .find(|(_, value)| !value.is_finite() || *value <= 0.0)
    {
        return Err(CliError::Config(format!(
            "{} must be a positive number, got {}",
            flag, value
        )));
    }
    Ok(())
}

/// Drive a session frame by frame on simulated time, reporting changes
/// through `report(seconds, name, value)`.
fn simulate<R>(
    args: &SimulateArgs,
    config: &ConfigFile,
    mut report: R,
) -> Result<SimulationSummary, CliError>
where
    R: FnMut(f64, &str, &str),
{
    let clock = ManualClock::shared();
    let mut session =
        AdaptiveSession::with_clock(config.session_config(), config.requested, clock.clone())?;
    let commands = session.command_sender();
    if !config.resolution_enabled {
        send(&commands, SessionCommand::SetResolutionEnabled(false))?;
    }
    if args.benchmark {
        send(&commands, SessionCommand::StartBenchmark)?;
    }

    let mut gpu = GpuModel::new(args.base_fps)?;
    let now = Cell::new(0.0);
    let mut changes =
        DirtyStateBatcher::new(|name: &str, value: &String| report(now.get(), name, value.as_str()));

    let mut active = session.active_configuration();
    let mut scale = session.resolution().current_scale();

    while now.get() < args.seconds {
        let spiking = args
            .spike_at
            .is_some_and(|start| now.get() >= start && now.get() < start + args.spike_secs);
        let load = if spiking { args.spike_factor } else { 1.0 };

        let fps = gpu.frame_fps(&active, scale) / load;
        let dt = 1.0 / fps;
        clock.advance_secs(dt);
        now.set(now.get() + dt);

        let decision = session.tick(dt, fps, &FrameTimings::from_fps(fps));
        if let Some(configuration) = decision.apply_configuration {
            active = configuration;
        }
        scale = decision.resolution_scale;

        changes.set("scale", format!("{:.2}", scale));
        changes.set("configuration", active.to_string());
        changes.set("benchmark", session.benchmark().phase().to_string());
        changes.set("idle", decision.idle.to_string());
        if let Some(event) = &decision.benchmark_event {
            tracing::debug!(frame = decision.frame, event = ?event, "Benchmark event");
        }
    }

    let (changes, suppressed) = (changes.writes(), changes.suppressed());
    Ok(SimulationSummary {
        frames: session.frame(),
        changes,
        suppressed,
        final_scale: scale,
        average_fps: session.monitor().snapshot().fps,
    })
}

fn send(
    commands: &tokio::sync::mpsc::UnboundedSender<SessionCommand>,
    command: SessionCommand,
) -> Result<(), CliError> {
    commands
        .send(command)
        .map_err(|e| CliError::Config(format!("Session closed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(seconds: f64) -> SimulateArgs {
        SimulateArgs {
            seconds,
            base_fps: DEFAULT_BASE_FPS,
            spike_at: None,
            spike_secs: 10.0,
            spike_factor: 3.0,
            benchmark: false,
        }
    }

    fn collect(args: &SimulateArgs, config: &ConfigFile) -> Vec<(String, String)> {
        let mut lines = Vec::new();
        simulate(args, config, |_, name, value| {
            lines.push((name.to_string(), value.to_string()))
        })
        .unwrap();
        lines
    }

    #[test]
    fn test_spike_lowers_scale_then_recovers() {
        let mut config = ConfigFile::default();
        config.requested = renderpilot::FeatureConfiguration::all(renderpilot::QualityLevel::Low);
        let args = SimulateArgs {
            spike_at: Some(2.0),
            spike_secs: 6.0,
            spike_factor: 4.0,
            ..args(30.0)
        };

        let scales: Vec<f64> = collect(&args, &config)
            .into_iter()
            .filter(|(name, _)| name == "scale")
            .map(|(_, value)| value.parse().unwrap())
            .collect();

        assert_eq!(scales.first(), Some(&1.0));
        assert!(scales.iter().any(|s| *s < 1.0));
        assert_eq!(scales.last(), Some(&1.0));
    }

    #[test]
    fn test_steady_load_reports_once() {
        let mut config = ConfigFile::default();
        config.requested = renderpilot::FeatureConfiguration::baseline();
        let mut reported = Vec::new();
        let summary = simulate(&args(5.0), &config, |_, name, _| {
            reported.push(name.to_string())
        })
        .unwrap();

        assert_eq!(reported, vec!["scale", "configuration", "benchmark", "idle"]);
        assert_eq!(summary.changes, 4);
        assert_eq!(summary.suppressed, summary.frames * 4 - 4);
    }

    #[test]
    fn test_benchmark_flag_runs_ladder() {
        let mut config = ConfigFile::default();
        config.benchmark = config
            .benchmark
            .clone()
            .with_test_duration(std::time::Duration::from_secs(1));
        let args = SimulateArgs {
            benchmark: true,
            ..args(10.0)
        };

        let phases: Vec<String> = collect(&args, &config)
            .into_iter()
            .filter(|(name, _)| name == "benchmark")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(phases, vec!["running", "completed"]);
    }

    #[test]
    fn test_rejects_non_positive_arguments() {
        assert!(validate(&args(0.0)).is_err());
        let bad_factor = SimulateArgs {
            spike_factor: -1.0,
            ..args(5.0)
        };
        assert!(validate(&bad_factor).is_err());
        assert!(validate(&args(1.0)).is_ok());
    }
}
