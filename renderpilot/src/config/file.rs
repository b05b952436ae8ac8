//! INI configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use super::error::ConfigFileError;
use super::keys::ConfigKey;
use crate::benchmark::BenchmarkConfig;
use crate::features::FeatureConfiguration;
use crate::loader::LoaderConfig;
use crate::logging::LoggingConfig;
use crate::monitor::MonitorConfig;
use crate::resolution::ResolutionConfig;
use crate::session::{SessionConfig, DEFAULT_CONFIGURATION_DEBOUNCE, DEFAULT_IDLE_THRESHOLD};
use crate::variant_cache::VariantCacheConfig;

/// Application directory name under the platform config directory.
const APP_DIR: &str = "renderpilot";

/// Configuration file name.
const FILE_NAME: &str = "config.ini";

/// Location of the user configuration file.
///
/// `<config dir>/renderpilot/config.ini`, falling back to the working
/// directory when the platform has no config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(FILE_NAME)
}

/// Every tunable, as stored in `config.ini`.
///
/// Missing sections and keys keep their defaults. Benchmark presets are not
/// stored; the built-in ladder is always used.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub resolution: ResolutionConfig,
    /// Whether dynamic resolution starts enabled.
    pub resolution_enabled: bool,
    pub variants: VariantCacheConfig,
    pub loader: LoaderConfig,
    /// Capabilities and quality the loader is asked for.
    pub requested: FeatureConfiguration,
    pub monitor: MonitorConfig,
    pub benchmark: BenchmarkConfig,
    pub idle_threshold: Duration,
    pub configuration_debounce: Duration,
    pub logging: LoggingConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            resolution: ResolutionConfig::default(),
            resolution_enabled: true,
            variants: VariantCacheConfig::default(),
            loader: LoaderConfig::default(),
            requested: FeatureConfiguration::all(crate::features::QualityLevel::High),
            monitor: MonitorConfig::default(),
            benchmark: BenchmarkConfig::default(),
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            configuration_debounce: DEFAULT_CONFIGURATION_DEBOUNCE,
            logging: LoggingConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Load from [`config_file_path`]. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigFileError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigFileError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;
        let config = Self::from_ini(&ini)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigFileError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to [`config_file_path`], creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to an explicit path, creating the directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let io_error = |source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        self.to_ini().write_to_file(path).map_err(io_error)?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        self.resolution.validate()?;
        self.benchmark.validate()?;
        Ok(())
    }

    /// Settings for an [`AdaptiveSession`](crate::session::AdaptiveSession).
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            resolution: self.resolution.clone(),
            monitor: self.monitor.clone(),
            benchmark: self.benchmark.clone(),
            idle_threshold: self.idle_threshold,
            configuration_debounce: self.configuration_debounce,
        }
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigFileError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini
    }
}
