//! The immutable feature configuration value and its packed key.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;
use super::types::{Feature, QualityLevel};

/// Shift of the quality field inside a [`VariantKey`].
const QUALITY_SHIFT: u16 = 8;

/// Mask of the quality field after shifting.
const QUALITY_MASK: u16 = 0b111;

/// Mask of every feature bit.
const FEATURE_MASK: u16 = (1 << Feature::ALL.len()) - 1;

/// Canonical, fixed-width fingerprint of a [`FeatureConfiguration`].
///
/// Two configurations produce the same key if and only if they are
/// structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey(u16);

impl VariantKey {
    /// Raw packed bits.
    pub fn bits(self) -> u16 {
        self.0
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Which optional capabilities are requested, and at what quality.
///
/// Values are immutable: the `with_*` methods return a new configuration.
///
/// # Example
///
/// ```
/// use renderpilot::features::{Feature, FeatureConfiguration, QualityLevel};
///
/// let config = FeatureConfiguration::new(QualityLevel::High)
///     .with(Feature::Lensing)
///     .with(Feature::Bloom);
///
/// assert!(config.is_enabled(Feature::Lensing));
/// assert!(!config.is_enabled(Feature::Starfield));
/// assert_eq!(FeatureConfiguration::from_key(config.key()), Ok(config));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfiguration {
    lensing: bool,
    accretion_disk: bool,
    doppler_beaming: bool,
    gravitational_redshift: bool,
    bloom: bool,
    starfield: bool,
    quality: QualityLevel,
}

impl FeatureConfiguration {
    /// All capabilities off at the given quality.
    pub fn new(quality: QualityLevel) -> Self {
        Self {
            quality,
            ..Default::default()
        }
    }

    /// Minimal configuration: everything off, lowest quality.
    pub fn baseline() -> Self {
        Self::new(QualityLevel::Low)
    }

    /// Every capability on at the given quality.
    pub fn all(quality: QualityLevel) -> Self {
        Feature::ALL
            .into_iter()
            .fold(Self::new(quality), |config, feature| config.with(feature))
    }

    /// Build from capability names.
    ///
    /// Names are parsed with [`Feature::from_str`](std::str::FromStr); an
    /// unknown or repeated name rejects the whole set.
    pub fn from_names<I, S>(names: I, quality: QualityLevel) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::new(quality);
        for name in names {
            let feature: Feature = name.as_ref().parse()?;
            if config.is_enabled(feature) {
                return Err(ConfigurationError::DuplicateFeature(
                    feature.name().to_string(),
                ));
            }
            config = config.with(feature);
        }
        Ok(config)
    }

    /// Decode a packed key.
    pub fn from_key(key: VariantKey) -> Result<Self, ConfigurationError> {
        let bits = key.bits();
        let quality_bits = (bits >> QUALITY_SHIFT) & QUALITY_MASK;
        let known = FEATURE_MASK | (QUALITY_MASK << QUALITY_SHIFT);

        if bits & !known != 0 {
            return Err(ConfigurationError::InvalidKey(bits));
        }
        let quality = QualityLevel::from_index(quality_bits as usize)
            .ok_or(ConfigurationError::InvalidKey(bits))?;

        Ok(Feature::ALL
            .into_iter()
            .filter(|feature| bits & feature.bit() != 0)
            .fold(Self::new(quality), |config, feature| config.with(feature)))
    }

    /// Copy with one capability enabled.
    pub fn with(self, feature: Feature) -> Self {
        self.with_feature(feature, true)
    }

    /// Copy with one capability disabled.
    pub fn without(self, feature: Feature) -> Self {
        self.with_feature(feature, false)
    }

    /// Copy with one capability set to `enabled`.
    pub fn with_feature(mut self, feature: Feature, enabled: bool) -> Self {
        *self.flag_mut(feature) = enabled;
        self
    }

    /// Copy with a different quality level.
    pub fn with_quality(mut self, quality: QualityLevel) -> Self {
        self.quality = quality;
        self
    }

    /// Whether a capability is enabled.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Lensing => self.lensing,
            Feature::AccretionDisk => self.accretion_disk,
            Feature::DopplerBeaming => self.doppler_beaming,
            Feature::GravitationalRedshift => self.gravitational_redshift,
            Feature::Bloom => self.bloom,
            Feature::Starfield => self.starfield,
        }
    }

    /// Quality level.
    pub fn quality(&self) -> QualityLevel {
        self.quality
    }

    /// Enabled capabilities in canonical order.
    pub fn enabled_features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL
            .into_iter()
            .filter(move |feature| self.is_enabled(*feature))
    }

    /// Number of enabled capabilities.
    pub fn enabled_count(&self) -> usize {
        self.enabled_features().count()
    }

    /// Canonical packed key.
    pub fn key(&self) -> VariantKey {
        let features = self
            .enabled_features()
            .fold(0u16, |bits, feature| bits | feature.bit());
        VariantKey(features | ((self.quality.index() as u16) << QUALITY_SHIFT))
    }

    fn flag_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::Lensing => &mut self.lensing,
            Feature::AccretionDisk => &mut self.accretion_disk,
            Feature::DopplerBeaming => &mut self.doppler_beaming,
            Feature::GravitationalRedshift => &mut self.gravitational_redshift,
            Feature::Bloom => &mut self.bloom,
            Feature::Starfield => &mut self.starfield,
        }
    }
}

impl fmt::Display for FeatureConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.enabled_features().map(Feature::name).collect();
        write!(f, "{}[{}]", self.quality, names.join(","))
    }
}
