//! Common types and utilities shared across CLI commands.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use renderpilot::{ConfigFile, Feature, FeatureConfiguration, QualityLevel, VariantKey};
use renderpilot::util::Memoizer;

use crate::error::CliError;

/// Frame rate of the modeled GPU on the cheapest possible frame.
pub const DEFAULT_BASE_FPS: f64 = 240.0;

/// Relative frame cost of each quality level.
const QUALITY_COST: [f64; 4] = [1.0, 1.6, 2.6, 4.0];

/// Synthetic renderer used by `benchmark` and `simulate`.
///
/// Frame cost grows with quality, enabled capabilities and pixel count. A
/// small deterministic ripple keeps min/max figures realistic.
#[derive(Debug)]
pub struct GpuModel {
    base_fps: f64,
    costs: Memoizer<VariantKey, f64>,
    frame: u64,
}

impl GpuModel {
    pub fn new(base_fps: f64) -> Result<Self, CliError> {
        if !base_fps.is_finite() || base_fps <= 0.0 {
            return Err(CliError::Config(format!(
                "Base FPS must be a positive number, got {}",
                base_fps
            )));
        }
        Ok(Self {
            base_fps,
            costs: Memoizer::new(),
            frame: 0,
        })
    }

    /// FPS of the next frame rendered with `configuration` at `scale`.
    pub fn frame_fps(&mut self, configuration: &FeatureConfiguration, scale: f64) -> f64 {
        let cost = *self
            .costs
            .get(configuration.key(), |_| Self::configuration_cost(configuration));
        let pixels = scale.clamp(0.1, 1.0).powi(2);
        let ripple = 1.0 + 0.03 * (self.frame as f64 * 0.7).sin();
        self.frame += 1;
        self.base_fps * ripple / (cost * (0.25 + 0.75 * pixels))
    }

    /// Configurations whose cost has been worked out.
    pub fn modeled_configurations(&self) -> usize {
        self.costs.len()
    }

    fn configuration_cost(configuration: &FeatureConfiguration) -> f64 {
        let quality = QUALITY_COST[configuration.quality().index()];
        configuration
            .enabled_features()
            .map(feature_weight)
            .fold(quality, |cost, weight| cost * (1.0 + weight))
    }
}

fn feature_weight(feature: Feature) -> f64 {
    match feature {
        Feature::Lensing => 0.35,
        Feature::AccretionDisk => 0.25,
        Feature::DopplerBeaming => 0.10,
        Feature::GravitationalRedshift => 0.08,
        Feature::Bloom => 0.20,
        Feature::Starfield => 0.05,
    }
}

/// Load the configuration file, from `path` when given.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Requested configuration with command-line overrides applied.
pub fn resolve_requested(
    config: &ConfigFile,
    features: Option<Vec<Feature>>,
    quality: Option<QualityLevel>,
) -> Result<FeatureConfiguration, CliError> {
    let quality = quality.unwrap_or_else(|| config.requested.quality());
    match features {
        Some(features) => Ok(FeatureConfiguration::from_names(
            features.iter().map(|f| f.name()),
            quality,
        )?),
        None => Ok(config.requested.with_quality(quality)),
    }
}

/// Progress bar over `len` units, or a hidden one when `quiet`.
pub fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}
