//! Addressable configuration keys.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::ConfigFileError;
use super::file::ConfigFile;
use crate::features::{FeatureConfiguration, QualityLevel};

/// One `section.key` setting in `config.ini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ResolutionEnabled,
    ResolutionMinScale,
    ResolutionMaxScale,
    ResolutionStep,
    ResolutionLowThreshold,
    ResolutionHighThreshold,
    ResolutionLowDwellSecs,
    ResolutionHighDwellSecs,
    ResolutionInterpolationRate,
    VariantsCompileBudgetMs,
    LoaderBaselineBudgetMs,
    LoaderFeatures,
    LoaderQuality,
    MonitorWindow,
    MonitorReduceFrameMs,
    MonitorIncreaseFrameMs,
    BenchmarkTestDurationSecs,
    BenchmarkTiers,
    SessionIdleThresholdSecs,
    SessionConfigurationDebounceMs,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            ResolutionEnabled,
            ResolutionMinScale,
            ResolutionMaxScale,
            ResolutionStep,
            ResolutionLowThreshold,
            ResolutionHighThreshold,
            ResolutionLowDwellSecs,
            ResolutionHighDwellSecs,
            ResolutionInterpolationRate,
            VariantsCompileBudgetMs,
            LoaderBaselineBudgetMs,
            LoaderFeatures,
            LoaderQuality,
            MonitorWindow,
            MonitorReduceFrameMs,
            MonitorIncreaseFrameMs,
            BenchmarkTestDurationSecs,
            BenchmarkTiers,
            SessionIdleThresholdSecs,
            SessionConfigurationDebounceMs,
            LoggingLevel,
            LoggingDirectory,
        ]
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            ResolutionEnabled
            | ResolutionMinScale
            | ResolutionMaxScale
            | ResolutionStep
            | ResolutionLowThreshold
            | ResolutionHighThreshold
            | ResolutionLowDwellSecs
            | ResolutionHighDwellSecs
            | ResolutionInterpolationRate => "resolution",
            VariantsCompileBudgetMs => "variants",
            LoaderBaselineBudgetMs | LoaderFeatures | LoaderQuality => "loader",
            MonitorWindow | MonitorReduceFrameMs | MonitorIncreaseFrameMs => "monitor",
            BenchmarkTestDurationSecs | BenchmarkTiers => "benchmark",
            SessionIdleThresholdSecs | SessionConfigurationDebounceMs => "session",
            LoggingLevel | LoggingDirectory => "logging",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            ResolutionEnabled => "enabled",
            ResolutionMinScale => "min_scale",
            ResolutionMaxScale => "max_scale",
            ResolutionStep => "step",
            ResolutionLowThreshold => "low_threshold",
            ResolutionHighThreshold => "high_threshold",
            ResolutionLowDwellSecs => "low_dwell_secs",
            ResolutionHighDwellSecs => "high_dwell_secs",
            ResolutionInterpolationRate => "interpolation_rate",
            VariantsCompileBudgetMs => "compile_budget_ms",
            LoaderBaselineBudgetMs => "baseline_budget_ms",
            LoaderFeatures => "features",
            LoaderQuality => "quality",
            MonitorWindow => "window",
            MonitorReduceFrameMs => "reduce_frame_ms",
            MonitorIncreaseFrameMs => "increase_frame_ms",
            BenchmarkTestDurationSecs => "test_duration_secs",
            BenchmarkTiers => "tiers",
            SessionIdleThresholdSecs => "idle_threshold_secs",
            SessionConfigurationDebounceMs => "configuration_debounce_ms",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as stored in the file. Empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        match self {
            ResolutionEnabled => config.resolution_enabled.to_string(),
            ResolutionMinScale => config.resolution.min_scale.to_string(),
            ResolutionMaxScale => config.resolution.max_scale.to_string(),
            ResolutionStep => config.resolution.step.to_string(),
            ResolutionLowThreshold => config.resolution.low_threshold.to_string(),
            ResolutionHighThreshold => config.resolution.high_threshold.to_string(),
            ResolutionLowDwellSecs => format_secs(config.resolution.low_dwell),
            ResolutionHighDwellSecs => format_secs(config.resolution.high_dwell),
            ResolutionInterpolationRate => config.resolution.interpolation_rate.to_string(),
            VariantsCompileBudgetMs => format_ms(config.variants.compile_budget),
            LoaderBaselineBudgetMs => format_ms(config.loader.baseline_budget),
            LoaderFeatures => config
                .requested
                .enabled_features()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", "),
            LoaderQuality => config.requested.quality().as_str().to_string(),
            MonitorWindow => config.monitor.window.to_string(),
            MonitorReduceFrameMs => config.monitor.reduce_frame_ms.to_string(),
            MonitorIncreaseFrameMs => config.monitor.increase_frame_ms.to_string(),
            BenchmarkTestDurationSecs => format_secs(config.benchmark.test_duration),
            BenchmarkTiers => config
                .benchmark
                .tiers
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            SessionIdleThresholdSecs => format_secs(config.idle_threshold),
            SessionConfigurationDebounceMs => format_ms(config.configuration_debounce),
            LoggingLevel => config.logging.level.clone(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it.
    ///
    /// Only the value's own format is checked here; cross-field constraints
    /// are checked by [`ConfigFile::validate`].
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigFileError> {
        use ConfigKey::*;
        let value = value.trim();
        match self {
            ResolutionEnabled => config.resolution_enabled = self.parse_bool(value)?,
            ResolutionMinScale => config.resolution.min_scale = self.parse_f64(value)?,
            ResolutionMaxScale => config.resolution.max_scale = self.parse_f64(value)?,
            ResolutionStep => config.resolution.step = self.parse_f64(value)?,
            ResolutionLowThreshold => config.resolution.low_threshold = self.parse_f64(value)?,
            ResolutionHighThreshold => config.resolution.high_threshold = self.parse_f64(value)?,
            ResolutionLowDwellSecs => config.resolution.low_dwell = self.parse_secs(value)?,
            ResolutionHighDwellSecs => config.resolution.high_dwell = self.parse_secs(value)?,
            ResolutionInterpolationRate => {
                config.resolution.interpolation_rate = self.parse_f64(value)?
            }
            VariantsCompileBudgetMs => config.variants.compile_budget = self.parse_ms(value)?,
            LoaderBaselineBudgetMs => config.loader.baseline_budget = self.parse_ms(value)?,
            LoaderFeatures => {
                let names = split_list(value);
                config.requested = FeatureConfiguration::from_names(names, config.requested.quality())
                    .map_err(|e| self.invalid(value, e))?;
            }
            LoaderQuality => {
                let quality: QualityLevel = value.parse().map_err(|e| self.invalid(value, e))?;
                config.requested = config.requested.with_quality(quality);
            }
            MonitorWindow => {
                let window: usize = value.parse().map_err(|e| self.invalid(value, e))?;
                if window == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.monitor.window = window;
            }
            MonitorReduceFrameMs => config.monitor.reduce_frame_ms = self.parse_f64(value)?,
            MonitorIncreaseFrameMs => config.monitor.increase_frame_ms = self.parse_f64(value)?,
            BenchmarkTestDurationSecs => config.benchmark.test_duration = self.parse_secs(value)?,
            BenchmarkTiers => {
                config.benchmark.tiers = split_list(value)
                    .map(|tier| self.parse_f64(tier))
                    .collect::<Result<_, _>>()?;
            }
            SessionIdleThresholdSecs => config.idle_threshold = self.parse_secs(value)?,
            SessionConfigurationDebounceMs => {
                config.configuration_debounce = self.parse_ms(value)?
            }
            LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.logging.level = value.to_string();
            }
            LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl fmt::Display) -> ConfigFileError {
        ConfigFileError::invalid_value(self.name(), value, reason.to_string())
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigFileError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_f64(&self, value: &str) -> Result<f64, ConfigFileError> {
        let parsed: f64 = value.parse().map_err(|e| self.invalid(value, e))?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(self.invalid(value, "expected a non-negative number"));
        }
        Ok(parsed)
    }

    fn parse_secs(&self, value: &str) -> Result<Duration, ConfigFileError> {
        let secs = self.parse_f64(value)?;
        Duration::try_from_secs_f64(secs).map_err(|e| self.invalid(value, e))
    }

    fn parse_ms(&self, value: &str) -> Result<Duration, ConfigFileError> {
        value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| self.invalid(value, e))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigFileError::UnknownKey(s.to_string()))
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn format_secs(duration: Duration) -> String {
    duration.as_secs_f64().to_string()
}

fn format_ms(duration: Duration) -> String {
    duration.as_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;

    #[test]
    fn test_names_unique_and_parseable() {
        let mut seen = std::collections::HashSet::new();
        for key in ConfigKey::all() {
            assert!(seen.insert(key.name()), "duplicate {}", key);
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_unknown_key() {
        let err = "resolution.speed".parse::<ConfigKey>().unwrap_err();
        assert!(matches!(err, ConfigFileError::UnknownKey(_)));
    }

    #[test]
    fn test_get_set_every_key_with_its_own_value() {
        let defaults = ConfigFile::default();
        let mut config = ConfigFile::default();
        for key in ConfigKey::all() {
            let value = key.get(&defaults);
            key.set(&mut config, &value)
                .unwrap_or_else(|e| panic!("{}: {}", key, e));
        }
        assert_eq!(config, defaults);
    }

    #[test]
    fn test_set_features_keeps_quality() {
        let mut config = ConfigFile::default();
        ConfigKey::LoaderQuality.set(&mut config, "low").unwrap();
        ConfigKey::LoaderFeatures
            .set(&mut config, "accretion-disk, Bloom")
            .unwrap();
        assert_eq!(config.requested.quality(), QualityLevel::Low);
        assert!(config.requested.is_enabled(Feature::AccretionDisk));
        assert!(config.requested.is_enabled(Feature::Bloom));
        assert_eq!(config.requested.enabled_count(), 2);

        ConfigKey::LoaderFeatures.set(&mut config, "").unwrap();
        assert_eq!(config.requested.enabled_count(), 0);
    }

    #[test]
    fn test_bool_forms() {
        let mut config = ConfigFile::default();
        for (text, expected) in [("off", false), ("YES", true), ("0", false), ("true", true)] {
            ConfigKey::ResolutionEnabled.set(&mut config, text).unwrap();
            assert_eq!(config.resolution_enabled, expected);
        }
        assert!(ConfigKey::ResolutionEnabled.set(&mut config, "maybe").is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::ResolutionStep.set(&mut config, "-0.1").is_err());
        assert!(ConfigKey::ResolutionStep.set(&mut config, "NaN").is_err());
        assert!(ConfigKey::VariantsCompileBudgetMs.set(&mut config, "1.5").is_err());
        assert!(ConfigKey::MonitorWindow.set(&mut config, "0").is_err());
        assert!(ConfigKey::BenchmarkTiers.set(&mut config, "60, x").is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_seconds_too_large_for_duration() {
        let mut config = ConfigFile::default();
        for key in [
            ConfigKey::ResolutionLowDwellSecs,
            ConfigKey::ResolutionHighDwellSecs,
            ConfigKey::BenchmarkTestDurationSecs,
            ConfigKey::SessionIdleThresholdSecs,
        ] {
            let err = key.set(&mut config, "1e30").unwrap_err();
            assert!(
                matches!(err, ConfigFileError::InvalidValue { key: ref name, .. } if *name == key.name()),
                "{} accepted 1e30",
                key
            );
        }
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_dwell_in_seconds() {
        let mut config = ConfigFile::default();
        ConfigKey::ResolutionHighDwellSecs
            .set(&mut config, "7.25")
            .unwrap();
        assert_eq!(config.resolution.high_dwell, Duration::from_millis(7250));
        assert_eq!(ConfigKey::ResolutionHighDwellSecs.get(&config), "7.25");
    }

    #[test]
    fn test_logging_directory_unset() {
        let mut config = ConfigFile::default();
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "");
        ConfigKey::LoggingDirectory
            .set(&mut config, "/var/log/renderpilot")
            .unwrap();
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/var/log/renderpilot"))
        );
    }
}
