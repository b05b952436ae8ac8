//! Dynamic render-resolution control.
//!
//! A dwell-time hysteresis loop over a render-scale factor. Sustained low
//! FPS lowers the target scale one step at a time; sustained high FPS raises
//! it. The exposed scale glides toward the target instead of snapping.
//!
//! # Control Loop
//!
//! ```text
//!   fps < low_threshold   for > low_dwell   ──► target -= step (≥ min_scale)
//!   fps > high_threshold  for > high_dwell  ──► target += step (≤ max_scale)
//!   otherwise                               ──► dwell accumulators reset
//!
//!   current += (target - current) × interpolation_rate   (every update)
//! ```
//!
//! Dwell is accumulated from the caller's frame `dt`, never from wall-clock
//! timestamps. The decrease dwell is shorter than the increase dwell: the
//! loop reacts quickly to a sustained slowdown but waits before upgrading
//! after a brief recovery.

mod config;
mod controller;

pub use config::ResolutionConfig;
pub use controller::{ResolutionController, ResolutionState};
