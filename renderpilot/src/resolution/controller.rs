//! The resolution control loop.

use serde::Serialize;

use super::config::ResolutionConfig;
use crate::features::ConfigurationError;

/// Residual gap below which the current scale snaps to the target.
const SNAP_EPSILON: f64 = 1e-4;

/// Snapshot of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionState {
    /// Scale exposed to the renderer.
    pub current_scale: f64,
    /// Scale the loop is gliding toward.
    pub target_scale: f64,
    /// Continuous low-FPS time, in seconds.
    pub below_threshold_elapsed: f64,
    /// Continuous high-FPS time, in seconds.
    pub above_threshold_elapsed: f64,
    /// Whether the loop is active.
    pub enabled: bool,
}

/// Dwell-time hysteresis controller for the render scale.
///
/// Owned by one render loop and updated once per frame.
///
/// # Example
///
/// ```
/// use renderpilot::resolution::ResolutionController;
///
/// let mut controller = ResolutionController::with_defaults();
/// for _ in 0..5 {
///     controller.update(30.0, 0.5);
/// }
/// assert_eq!(controller.state().target_scale, 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct ResolutionController {
    config: ResolutionConfig,
    current_scale: f64,
    target_scale: f64,
    below_elapsed: f64,
    above_elapsed: f64,
    enabled: bool,
}

impl ResolutionController {
    /// Create an enabled controller at full scale.
    pub fn new(config: ResolutionConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            current_scale: config.max_scale,
            target_scale: config.max_scale,
            below_elapsed: 0.0,
            above_elapsed: 0.0,
            enabled: true,
            config,
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        let config = ResolutionConfig::default();
        Self {
            current_scale: config.max_scale,
            target_scale: config.max_scale,
            below_elapsed: 0.0,
            above_elapsed: 0.0,
            enabled: true,
            config,
        }
    }

    /// Feed one frame's FPS and delta time (seconds). Returns the current
    /// scale.
    ///
    /// Non-finite or negative inputs leave the state untouched.
    pub fn update(&mut self, fps: f64, dt: f64) -> f64 {
        if !self.enabled {
            self.pin_to_max();
            return self.current_scale;
        }

        if !fps.is_finite() || fps < 0.0 || !dt.is_finite() || dt < 0.0 {
            tracing::trace!(fps, dt, "Ignoring invalid resolution sample");
            return self.current_scale;
        }

        if fps < self.config.low_threshold {
            self.above_elapsed = 0.0;
            self.below_elapsed += dt;
            if self.below_elapsed > self.config.low_dwell.as_secs_f64() {
                self.below_elapsed = 0.0;
                self.move_target(-self.config.step, fps);
            }
        } else if fps > self.config.high_threshold {
            self.below_elapsed = 0.0;
            self.above_elapsed += dt;
            if self.above_elapsed > self.config.high_dwell.as_secs_f64() {
                self.above_elapsed = 0.0;
                self.move_target(self.config.step, fps);
            }
        } else {
            self.below_elapsed = 0.0;
            self.above_elapsed = 0.0;
        }

        self.interpolate();
        self.current_scale
    }

    /// Lower the target by one step immediately.
    ///
    /// Hook for a higher layer reacting to resource exhaustion. Returns the
    /// new target. No effect while disabled.
    pub fn step_down(&mut self) -> f64 {
        if self.enabled {
            self.below_elapsed = 0.0;
            self.move_target(-self.config.step, f64::NAN);
        }
        self.target_scale
    }

    /// Enable or disable the loop. Disabling pins the scale to the maximum.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!(enabled, "Dynamic resolution toggled");
        }
        self.enabled = enabled;
        if !enabled {
            self.pin_to_max();
        }
    }

    /// Whether the loop is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return to full scale with empty dwell accumulators.
    pub fn reset(&mut self) {
        self.pin_to_max();
    }

    /// Jump straight to `scale` with empty dwell accumulators.
    ///
    /// The scale is clamped to the configured range. Used to continue from
    /// a measured scale instead of full resolution. Pinned to the maximum
    /// while disabled.
    pub fn start_at(&mut self, scale: f64) {
        if !self.enabled || !scale.is_finite() {
            self.pin_to_max();
            return;
        }
        let scale = quantize(scale).clamp(self.config.min_scale, self.config.max_scale);
        self.current_scale = scale;
        self.target_scale = scale;
        self.below_elapsed = 0.0;
        self.above_elapsed = 0.0;
        tracing::debug!(scale, "Resolution restarted");
    }

    /// Scale exposed to the renderer.
    pub fn current_scale(&self) -> f64 {
        self.current_scale
    }

    /// Snapshot of the loop.
    pub fn state(&self) -> ResolutionState {
        ResolutionState {
            current_scale: self.current_scale,
            target_scale: self.target_scale,
            below_threshold_elapsed: self.below_elapsed,
            above_threshold_elapsed: self.above_elapsed,
            enabled: self.enabled,
        }
    }

    /// Apply the current scale to a framebuffer size. Never below 1×1.
    pub fn scaled_resolution(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.current_scale).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// The configuration in use.
    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    fn pin_to_max(&mut self) {
        self.current_scale = self.config.max_scale;
        self.target_scale = self.config.max_scale;
        self.below_elapsed = 0.0;
        self.above_elapsed = 0.0;
    }

    fn move_target(&mut self, delta: f64, fps: f64) {
        let old = self.target_scale;
        let new = quantize(old + delta).clamp(self.config.min_scale, self.config.max_scale);
        if new == old {
            return;
        }
        self.target_scale = new;
        tracing::info!(from = old, to = new, fps, "Resolution target changed");
    }

    fn interpolate(&mut self) {
        let gap = self.target_scale - self.current_scale;
        self.current_scale += gap * self.config.interpolation_rate;
        if (self.target_scale - self.current_scale).abs() < SNAP_EPSILON {
            self.current_scale = self.target_scale;
        }
    }
}

impl Default for ResolutionController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Round to six decimals so repeated steps don't drift (0.7999999...).
fn quantize(scale: f64) -> f64 {
    (scale * 1e6).round() / 1e6
}
