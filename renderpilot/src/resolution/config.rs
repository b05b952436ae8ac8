//! Resolution controller configuration.

use std::time::Duration;

use crate::features::ConfigurationError;

/// Tuning for [`ResolutionController`](super::ResolutionController).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionConfig {
    /// Lowest allowed scale.
    pub min_scale: f64,

    /// Highest allowed scale, and the scale while disabled.
    pub max_scale: f64,

    /// Target change per dwell trigger.
    pub step: f64,

    /// FPS below this counts toward a decrease.
    pub low_threshold: f64,

    /// FPS above this counts toward an increase.
    pub high_threshold: f64,

    /// Continuous low-FPS time required before stepping down.
    pub low_dwell: Duration,

    /// Continuous high-FPS time required before stepping up.
    pub high_dwell: Duration,

    /// Fraction of the remaining gap closed per update, in `(0, 1]`.
    pub interpolation_rate: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 1.0,
            step: 0.1,
            low_threshold: 60.0,
            high_threshold: 75.0,
            low_dwell: Duration::from_secs(2),
            high_dwell: Duration::from_secs(5),
            interpolation_rate: 0.1,
        }
    }
}

impl ResolutionConfig {
    /// Set the scale range.
    pub fn with_scale_range(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    /// Set the step size.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the FPS thresholds.
    pub fn with_thresholds(mut self, low: f64, high: f64) -> Self {
        self.low_threshold = low;
        self.high_threshold = high;
        self
    }

    /// Set the dwell times.
    pub fn with_dwell(mut self, low: Duration, high: Duration) -> Self {
        self.low_dwell = low;
        self.high_dwell = high;
        self
    }

    /// Set the interpolation rate.
    pub fn with_interpolation_rate(mut self, rate: f64) -> Self {
        self.interpolation_rate = rate;
        self
    }

    /// Check that the parameters describe a usable control loop.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let finite = [
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("step", self.step),
            ("low_threshold", self.low_threshold),
            ("high_threshold", self.high_threshold),
            ("interpolation_rate", self.interpolation_rate),
        ];
        if let Some((name, value)) = finite.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigurationError::invalid(
                name,
                format!("{} is not a finite number", value),
            ));
        }

        if self.min_scale <= 0.0 {
            return Err(ConfigurationError::invalid(
                "min_scale",
                format!("{} must be positive", self.min_scale),
            ));
        }
        if self.min_scale > self.max_scale {
            return Err(ConfigurationError::invalid(
                "min_scale",
                format!(
                    "{} is greater than max_scale {}",
                    self.min_scale, self.max_scale
                ),
            ));
        }
        if self.step <= 0.0 {
            return Err(ConfigurationError::invalid(
                "step",
                format!("{} must be positive", self.step),
            ));
        }
        if self.low_threshold > self.high_threshold {
            return Err(ConfigurationError::invalid(
                "low_threshold",
                format!(
                    "{} is greater than high_threshold {}",
                    self.low_threshold, self.high_threshold
                ),
            ));
        }
        if self.interpolation_rate <= 0.0 || self.interpolation_rate > 1.0 {
            return Err(ConfigurationError::invalid(
                "interpolation_rate",
                format!("{} is outside (0, 1]", self.interpolation_rate),
            ));
        }
        Ok(())
    }
}
