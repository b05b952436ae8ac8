//! Loader errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::variant_cache::VariantError;

/// Failures that stop the loader.
///
/// Individual capability failures are not errors: they are recorded in the
/// loader state and the batch continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    /// The base source is empty.
    #[error("Base source is empty")]
    InvalidSource,

    /// The backend was invalidated mid-run. Reset and start over.
    #[error("Compilation backend lost: {0}")]
    BackendLost(#[source] BackendError),
}

impl LoaderError {
    /// Convert a cache error that must abort the run.
    ///
    /// Returns `None` for per-variant compile failures, which the loader
    /// records instead of propagating.
    pub(crate) fn from_variant(err: VariantError) -> Option<Self> {
        match err {
            VariantError::InvalidSource => Some(LoaderError::InvalidSource),
            VariantError::BackendLost(inner) => Some(LoaderError::BackendLost(inner)),
            VariantError::Compilation { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureConfiguration;

    #[test]
    fn test_from_variant() {
        assert_eq!(
            LoaderError::from_variant(VariantError::InvalidSource),
            Some(LoaderError::InvalidSource)
        );

        let lost = BackendError::ContextLost("gone".to_string());
        assert_eq!(
            LoaderError::from_variant(VariantError::BackendLost(lost.clone())),
            Some(LoaderError::BackendLost(lost))
        );

        let config = FeatureConfiguration::baseline();
        assert_eq!(
            LoaderError::from_variant(VariantError::Compilation {
                key: config.key(),
                configuration: config,
                log: "x".to_string(),
            }),
            None
        );
    }
}
