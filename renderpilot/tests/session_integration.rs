//! Integration tests for the per-frame adaptive session.
//!
//! These tests verify the complete control flow:
//! - config file → session construction
//! - FPS signal → resolution hysteresis → render scale
//! - benchmark run → tiered recommendation → applied configuration
//! - commands from other threads
//!
//! Run with: `cargo test --test session_integration`

use std::sync::Arc;
use std::time::Duration;

use renderpilot::{
    AdaptiveSession, BenchmarkEvent, BenchmarkPhase, ConfigFile, FeatureConfiguration,
    FrameDecision, FrameTimings, ManualClock, QualityLevel, QualityPreset, SessionCommand,
};

// ============================================================================
// Helper Functions
// ============================================================================

const FRAME: Duration = Duration::from_millis(100);

const CONFIG: &str = "\
[resolution]
low_threshold = 60
high_threshold = 75

[benchmark]
test_duration_secs = 2
tiers = 60, 35, 24

[session]
idle_threshold_secs = 10
configuration_debounce_ms = 200
";

fn session_from_config(clock: &Arc<ManualClock>) -> AdaptiveSession {
    let config = ConfigFile::parse(CONFIG).unwrap();
    AdaptiveSession::with_clock(
        config.session_config(),
        FeatureConfiguration::baseline(),
        clock.clone(),
    )
    .unwrap()
}

fn tick(session: &mut AdaptiveSession, clock: &ManualClock, fps: f64) -> FrameDecision {
    clock.advance(FRAME);
    session.tick(FRAME.as_secs_f64(), fps, &FrameTimings::from_fps(fps))
}

/// Frame rate a hypothetical GPU reaches at each quality level.
fn modeled_fps(configuration: &FeatureConfiguration) -> f64 {
    match configuration.quality() {
        QualityLevel::Low => 140.0,
        QualityLevel::Medium => 72.0,
        QualityLevel::High => 41.0,
        QualityLevel::Ultra => 19.0,
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Sustained low FPS lowers the scale one step; sustained high FPS brings it
/// back to full resolution.
#[test]
fn test_scale_drops_and_recovers() {
    let clock = ManualClock::shared();
    let mut session = session_from_config(&clock);

    for _ in 0..19 {
        tick(&mut session, &clock, 30.0);
    }
    assert_eq!(session.resolution().state().target_scale, 1.0);

    for _ in 0..2 {
        tick(&mut session, &clock, 30.0);
    }
    assert_eq!(session.resolution().state().target_scale, 0.9);

    let mut last = 0.0;
    for _ in 0..200 {
        last = tick(&mut session, &clock, 90.0).resolution_scale;
    }
    assert_eq!(session.resolution().state().target_scale, 1.0);
    assert_eq!(last, 1.0);
}

/// FPS flickering across the threshold never accumulates enough dwell time.
#[test]
fn test_flicker_does_not_change_scale() {
    let clock = ManualClock::shared();
    let mut session = session_from_config(&clock);

    for frame in 0..300 {
        let fps = if frame % 2 == 0 { 50.0 } else { 80.0 };
        let decision = tick(&mut session, &clock, fps);
        assert_eq!(decision.resolution_scale, 1.0);
    }
}

/// A full benchmark run over the default ladder picks the best preset that
/// holds 60 FPS and applies it.
#[test]
fn test_benchmark_recommends_highest_preset_meeting_first_tier() {
    let clock = ManualClock::shared();
    let mut session = session_from_config(&clock);
    let ladder = QualityPreset::default_ladder();
    let tx = session.command_sender();

    tx.send(SessionCommand::StartBenchmark).unwrap();

    let mut presets_started = vec![0];
    let mut completion = None;
    for _ in 0..500 {
        let fps = modeled_fps(&session.active_configuration());
        let decision = tick(&mut session, &clock, fps);
        match decision.benchmark_event {
            Some(BenchmarkEvent::PresetStarted { index, .. }) => presets_started.push(index),
            Some(BenchmarkEvent::Completed { report, saved }) => {
                completion = Some((report, saved, decision.apply_configuration));
                assert_eq!(decision.resolution_scale, ladder[1].resolution_scale);
                break;
            }
            None => {}
        }
    }

    assert_eq!(presets_started, vec![0, 1, 2, 3]);
    let (report, saved, applied) = completion.unwrap();
    assert_eq!(saved, FeatureConfiguration::baseline());
    assert_eq!(report.results.len(), ladder.len());
    for (result, preset) in report.results.iter().zip(&ladder) {
        assert_eq!(result.preset_name, preset.name);
        assert_eq!(result.average_fps, modeled_fps(&preset.configuration));
        assert!(result.test_duration_seconds > 2.0);
    }

    assert_eq!(report.recommendation.preset_name, "medium");
    assert_eq!(report.recommendation.tier_fps, Some(60.0));
    assert_eq!(applied, Some(ladder[1].configuration));
    assert_eq!(session.active_configuration(), ladder[1].configuration);
    assert_eq!(session.benchmark().phase(), BenchmarkPhase::Completed);
    assert_eq!(session.benchmark().overall_progress(), 1.0);
    assert_eq!(session.resolution().state().target_scale, 0.75);
}

/// Cancelling mid-run restores the exact configuration the run started from,
/// and the next run starts with no leftover results.
#[test]
fn test_cancel_then_restart() {
    let clock = ManualClock::shared();
    let initial = FeatureConfiguration::new(QualityLevel::High);
    let config = ConfigFile::parse(CONFIG).unwrap();
    let mut session =
        AdaptiveSession::with_clock(config.session_config(), initial, clock.clone()).unwrap();
    let tx = session.command_sender();

    tx.send(SessionCommand::StartBenchmark).unwrap();
    for _ in 0..30 {
        tick(&mut session, &clock, 100.0);
    }
    assert_eq!(session.benchmark().current_preset_index(), Some(1));
    assert_eq!(session.benchmark().results().len(), 1);

    tx.send(SessionCommand::CancelBenchmark).unwrap();
    let decision = tick(&mut session, &clock, 100.0);
    assert_eq!(decision.apply_configuration, Some(initial));
    assert_eq!(session.active_configuration(), initial);

    tx.send(SessionCommand::StartBenchmark).unwrap();
    tick(&mut session, &clock, 100.0);
    assert_eq!(session.benchmark().phase(), BenchmarkPhase::Running);
    assert_eq!(session.benchmark().current_preset_index(), Some(0));
    assert!(session.benchmark().results().is_empty());
}

/// A UI thread and a watchdog thread both steer the session.
#[test]
fn test_commands_from_multiple_threads() {
    let clock = ManualClock::shared();
    let mut session = session_from_config(&clock);
    let requested = FeatureConfiguration::all(QualityLevel::Medium);

    let ui = session.command_sender();
    let watchdog = session.command_sender();
    let handles = [
        std::thread::spawn(move || {
            ui.send(SessionCommand::UserActivity).unwrap();
            ui.send(SessionCommand::RequestConfiguration(requested))
                .unwrap();
        }),
        std::thread::spawn(move || {
            watchdog.send(SessionCommand::StepDown).unwrap();
        }),
    ];
    for handle in handles {
        handle.join().unwrap();
    }

    let first = tick(&mut session, &clock, 70.0);
    assert_eq!(session.resolution().state().target_scale, 0.9);
    assert_eq!(first.apply_configuration, None);
    assert!(!first.idle);

    let applied: Vec<_> = (0..5)
        .filter_map(|_| tick(&mut session, &clock, 70.0).apply_configuration)
        .collect();
    assert_eq!(applied, vec![requested]);
}

/// No input for longer than the idle threshold flags the session idle until
/// activity is seen again.
#[test]
fn test_idle_detection() {
    let clock = ManualClock::shared();
    let mut session = session_from_config(&clock);

    let mut decision = tick(&mut session, &clock, 60.0);
    assert!(!decision.idle);
    for _ in 0..100 {
        decision = tick(&mut session, &clock, 60.0);
    }
    assert!(decision.idle);

    session
        .command_sender()
        .send(SessionCommand::UserActivity)
        .unwrap();
    assert!(!tick(&mut session, &clock, 60.0).idle);
}
