//! CLI error type.

use renderpilot::{
    BenchmarkError, ConfigFileError, ConfigurationError, LoaderError, LoggingError,
};
use thiserror::Error;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command-line input or configuration value.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("Load failed: {0}")]
    Loader(#[from] LoaderError),

    #[error("Benchmark failed: {0}")]
    Benchmark(#[from] BenchmarkError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
