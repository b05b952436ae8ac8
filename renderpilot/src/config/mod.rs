//! Persistent configuration.
//!
//! All tunables live in one INI file, by default
//! `<config dir>/renderpilot/config.ini`:
//!
//! ```ini
//! [resolution]
//! enabled = true
//! min_scale = 0.5
//! low_threshold = 60
//! low_dwell_secs = 2
//!
//! [loader]
//! features = lensing, bloom, starfield
//! quality = high
//!
//! [benchmark]
//! test_duration_secs = 5
//! tiers = 60, 35, 24
//! ```
//!
//! Missing keys keep their defaults. [`ConfigKey`] addresses single
//! settings by `section.key` name for command-line editing.

mod error;
mod file;
mod keys;

pub use error::ConfigFileError;
pub use file::{config_file_path, ConfigFile};
pub use keys::ConfigKey;
