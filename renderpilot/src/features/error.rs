//! Configuration boundary errors.

use thiserror::Error;

/// Malformed or invalid configuration input.
///
/// Raised where configurations enter the system (name parsing, INI loading,
/// controller parameter validation). A rejected configuration never reaches
/// the variant cache.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Feature name not recognized.
    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),

    /// Quality level name not recognized.
    #[error("Unknown quality level '{0}'")]
    UnknownQuality(String),

    /// The same feature was listed more than once.
    #[error("Feature '{0}' listed more than once")]
    DuplicateFeature(String),

    /// A variant key carries bits that no configuration produces.
    #[error("Invalid variant key {0:#06x}")]
    InvalidKey(u16),

    /// A numeric parameter is outside its valid range.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigurationError {
    /// Shorthand for [`ConfigurationError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::UnknownFeature("fog".to_string());
        assert_eq!(err.to_string(), "Unknown feature 'fog'");

        let err = ConfigurationError::InvalidKey(0x0800);
        assert_eq!(err.to_string(), "Invalid variant key 0x0800");

        let err = ConfigurationError::invalid("step", "must be positive");
        assert_eq!(err.to_string(), "Invalid parameter step: must be positive");
    }
}
