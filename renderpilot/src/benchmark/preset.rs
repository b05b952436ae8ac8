//! Quality presets.

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureConfiguration, QualityLevel};

/// A named combination of capabilities, quality level and render scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPreset {
    pub name: String,
    pub configuration: FeatureConfiguration,
    pub resolution_scale: f64,
}

impl QualityPreset {
    pub fn new(
        name: impl Into<String>,
        configuration: FeatureConfiguration,
        resolution_scale: f64,
    ) -> Self {
        Self {
            name: name.into(),
            configuration,
            resolution_scale,
        }
    }

    /// The built-in ladder, lowest quality first.
    ///
    /// | preset | quality | capabilities                         | scale |
    /// |--------|---------|--------------------------------------|-------|
    /// | low    | low     | lensing                              | 0.5   |
    /// | medium | medium  | + accretion disk, starfield          | 0.75  |
    /// | high   | high    | + doppler beaming, redshift          | 1.0   |
    /// | ultra  | ultra   | everything                           | 1.0   |
    pub fn default_ladder() -> Vec<QualityPreset> {
        let low = FeatureConfiguration::new(QualityLevel::Low).with(Feature::Lensing);
        let medium = low
            .with_quality(QualityLevel::Medium)
            .with(Feature::AccretionDisk)
            .with(Feature::Starfield);
        let high = medium
            .with_quality(QualityLevel::High)
            .with(Feature::DopplerBeaming)
            .with(Feature::GravitationalRedshift);
        let ultra = FeatureConfiguration::all(QualityLevel::Ultra);

        vec![
            QualityPreset::new("low", low, 0.5),
            QualityPreset::new("medium", medium, 0.75),
            QualityPreset::new("high", high, 1.0),
            QualityPreset::new("ultra", ultra, 1.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder_ascends() {
        let ladder = QualityPreset::default_ladder();
        let names: Vec<&str> = ladder.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["low", "medium", "high", "ultra"]);

        for pair in ladder.windows(2) {
            assert!(pair[0].configuration.quality() < pair[1].configuration.quality());
            assert!(
                pair[0].configuration.enabled_count() <= pair[1].configuration.enabled_count()
            );
            assert!(pair[0].resolution_scale <= pair[1].resolution_scale);
        }
        assert_eq!(ladder[3].configuration.enabled_count(), Feature::ALL.len());
    }
}
