//! Benchmark results and the tiered recommendation.

use serde::Serialize;

/// Measurements for one preset. Created once when the preset finishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub preset_name: String,
    pub average_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub average_frame_time_ms: f64,
    pub test_duration_seconds: f64,
    /// Valid FPS samples behind the figures.
    pub samples: u64,
}

/// The preset chosen at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Index into the preset list.
    pub preset_index: usize,
    pub preset_name: String,
    pub average_fps: f64,
    /// Tier the preset met, or `None` for the lowest-quality fallback.
    pub tier_fps: Option<f64>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub results: Vec<BenchmarkResult>,
    pub recommendation: Recommendation,
}

/// Pick a preset from `results` (lowest quality first).
///
/// Tiers are tried in order; within a tier results are scanned from the
/// highest quality down. Falls back to the first result. Returns `None` only
/// when `results` is empty.
pub fn recommend(results: &[BenchmarkResult], tiers: &[f64]) -> Option<Recommendation> {
    let pick = |index: usize, tier_fps: Option<f64>| {
        let result = &results[index];
        Recommendation {
            preset_index: index,
            preset_name: result.preset_name.clone(),
            average_fps: result.average_fps,
            tier_fps,
        }
    };

    for &tier in tiers {
        if let Some(index) = results.iter().rposition(|r| r.average_fps >= tier) {
            return Some(pick(index, Some(tier)));
        }
    }

    if results.is_empty() {
        None
    } else {
        Some(pick(0, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, fps: f64) -> BenchmarkResult {
        BenchmarkResult {
            preset_name: name.to_string(),
            average_fps: fps,
            min_fps: fps,
            max_fps: fps,
            average_frame_time_ms: 1000.0 / fps,
            test_duration_seconds: 5.0,
            samples: 1,
        }
    }

    const TIERS: [f64; 3] = [60.0, 35.0, 24.0];

    #[test]
    fn test_highest_preset_meeting_first_tier() {
        let results = vec![
            result("low", 140.0),
            result("medium", 90.0),
            result("high", 61.0),
            result("ultra", 40.0),
        ];
        let rec = recommend(&results, &TIERS).unwrap();
        assert_eq!(rec.preset_name, "high");
        assert_eq!(rec.tier_fps, Some(60.0));
    }

    #[test]
    fn test_falls_to_second_tier() {
        let results = vec![
            result("low", 50.0),
            result("medium", 36.0),
            result("high", 30.0),
            result("ultra", 20.0),
        ];
        let rec = recommend(&results, &TIERS).unwrap();
        assert_eq!(rec.preset_name, "medium");
        assert_eq!(rec.preset_index, 1);
        assert_eq!(rec.tier_fps, Some(35.0));
    }

    #[test]
    fn test_tier_boundary_inclusive() {
        let results = vec![result("low", 24.0), result("high", 23.9)];
        let rec = recommend(&results, &TIERS).unwrap();
        assert_eq!(rec.preset_name, "low");
        assert_eq!(rec.tier_fps, Some(24.0));
    }

    #[test]
    fn test_fallback_to_lowest() {
        let results = vec![result("low", 15.0), result("ultra", 5.0)];
        let rec = recommend(&results, &TIERS).unwrap();
        assert_eq!(rec.preset_index, 0);
        assert_eq!(rec.tier_fps, None);
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(recommend(&[], &TIERS), None);
    }
}
