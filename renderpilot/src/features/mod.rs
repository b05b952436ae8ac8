//! Feature configurations: which optional capabilities are requested, and at
//! what quality.
//!
//! A [`FeatureConfiguration`] is a small immutable value used as cache-key
//! material. It canonicalizes to a bit-packed [`VariantKey`]:
//!
//! ```text
//!  bit   15 ..... 11 | 10  9  8 | 7  6 | 5  4  3  2  1  0
//!        reserved    | quality  | 0  0 | S  B  R  D  A  L
//!
//!  L lensing   A accretion disk   D doppler beaming
//!  R redshift  B bloom            S starfield
//! ```
//!
//! Parsing feature and quality names is the boundary where malformed input is
//! rejected with a [`ConfigurationError`]; nothing past that point ever sees
//! an invalid configuration.

mod configuration;
mod error;
mod types;

pub use configuration::{FeatureConfiguration, VariantKey};
pub use error::ConfigurationError;
pub use types::{Feature, QualityLevel};
