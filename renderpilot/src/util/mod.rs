//! Small stateful helpers shared by the controllers and hosts.
//!
//! - [`Memoizer`]: compute once per distinct key, keep forever.
//! - [`Debouncer`]: deliver the last value after a quiet period.
//! - [`IdleTracker`]: idle once no activity has been seen for a while.
//! - [`DirtyStateBatcher`]: forward a value downstream only when it changed.
//!
//! None of these spawn timers. Time-based helpers read a
//! [`SharedClock`](crate::clock::SharedClock) when polled.

mod debounce;
mod dirty;
mod idle;
mod memo;

pub use debounce::Debouncer;
pub use dirty::DirtyStateBatcher;
pub use idle::IdleTracker;
pub use memo::Memoizer;
