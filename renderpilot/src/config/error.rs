use std::path::PathBuf;

use thiserror::Error;

use crate::features::ConfigurationError;

/// Errors reading, writing or editing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Values parse individually but do not form a valid configuration.
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

impl ConfigFileError {
    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigFileError::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
