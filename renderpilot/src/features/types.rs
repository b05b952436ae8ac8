//! Optional capabilities and quality levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// An optional rendering capability that can be compiled in or out.
///
/// Declaration order is significant: it fixes each capability's bit in the
/// [`VariantKey`](super::VariantKey) and the order of `#define` lines in a
/// specialized source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Gravitational lensing of the background.
    Lensing,
    /// Volumetric accretion disk.
    AccretionDisk,
    /// Relativistic Doppler beaming of disk emission.
    DopplerBeaming,
    /// Gravitational redshift of disk emission.
    GravitationalRedshift,
    /// Bloom post-process.
    Bloom,
    /// Procedural star field.
    Starfield,
}

impl Feature {
    /// Every capability, in canonical order.
    pub const ALL: [Feature; 6] = [
        Feature::Lensing,
        Feature::AccretionDisk,
        Feature::DopplerBeaming,
        Feature::GravitationalRedshift,
        Feature::Bloom,
        Feature::Starfield,
    ];

    /// Canonical position of this capability.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit in the packed variant key.
    pub fn bit(self) -> u16 {
        1 << self.index()
    }

    /// Config-file name (`snake_case`).
    pub fn name(self) -> &'static str {
        match self {
            Feature::Lensing => "lensing",
            Feature::AccretionDisk => "accretion_disk",
            Feature::DopplerBeaming => "doppler_beaming",
            Feature::GravitationalRedshift => "gravitational_redshift",
            Feature::Bloom => "bloom",
            Feature::Starfield => "starfield",
        }
    }

    /// Preprocessor flag injected into specialized sources.
    pub fn define_name(self) -> &'static str {
        match self {
            Feature::Lensing => "ENABLE_LENSING",
            Feature::AccretionDisk => "ENABLE_ACCRETION_DISK",
            Feature::DopplerBeaming => "ENABLE_DOPPLER_BEAMING",
            Feature::GravitationalRedshift => "ENABLE_GRAVITATIONAL_REDSHIFT",
            Feature::Bloom => "ENABLE_BLOOM",
            Feature::Starfield => "ENABLE_STARFIELD",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Feature {
    type Err = ConfigurationError;

    /// Accepts `snake_case` or `kebab-case`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownFeature(s.trim().to_string()))
    }
}

/// Global quality level of a configuration.
///
/// Ordered from cheapest to most expensive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Minimal sample counts; the baseline level.
    #[default]
    Low,
    /// Balanced.
    Medium,
    /// High sample counts.
    High,
    /// Everything maxed.
    Ultra,
}

impl QualityLevel {
    /// Every level, lowest first.
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::Low,
        QualityLevel::Medium,
        QualityLevel::High,
        QualityLevel::Ultra,
    ];

    /// Position in [`QualityLevel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Level at a given index, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
            QualityLevel::Ultra => "ultra",
        }
    }

    /// One-hot constant injected into specialized sources.
    pub fn define_name(self) -> &'static str {
        match self {
            QualityLevel::Low => "QUALITY_LOW",
            QualityLevel::Medium => "QUALITY_MEDIUM",
            QualityLevel::High => "QUALITY_HIGH",
            QualityLevel::Ultra => "QUALITY_ULTRA",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityLevel::Low),
            "medium" => Ok(QualityLevel::Medium),
            "high" => Ok(QualityLevel::High),
            "ultra" => Ok(QualityLevel::Ultra),
            _ => Err(ConfigurationError::UnknownQuality(s.trim().to_string())),
        }
    }
}
