//! Rolling performance statistics.
//!
//! [`RollingStatistics`] is a fixed-capacity ring buffer that keeps a
//! running sum, so the average of the window is available in O(1) and is
//! always exact for the values it holds. [`PerformanceMonitor`] keeps one
//! buffer per timing channel and answers the two questions the quality
//! logic asks every frame: should quality go down, may it go up.
//!
//! ```text
//!  FrameTimings ──► PerformanceMonitor
//!                    ├─ frame  RollingStatistics ──► cached average ──► should_reduce_quality
//!                    ├─ cpu    RollingStatistics                    └─► should_increase_quality
//!                    ├─ gpu    RollingStatistics
//!                    └─ idle   RollingStatistics
//! ```

mod performance;
mod rolling;

pub use performance::{FrameTimings, MonitorConfig, PerformanceMonitor, PerformanceSnapshot};
pub use rolling::RollingStatistics;
