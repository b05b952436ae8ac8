//! Variant cache errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::features::{FeatureConfiguration, VariantKey};

/// Errors returned by [`VariantCache`](super::VariantCache).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariantError {
    /// The base source is empty; rejected before touching the cache.
    #[error("Base source is empty")]
    InvalidSource,

    /// The backend rejected the specialized source. Nothing was cached.
    #[error("Variant {key} ({configuration}) failed to compile: {log}")]
    Compilation {
        key: VariantKey,
        configuration: FeatureConfiguration,
        log: String,
    },

    /// The backend was invalidated underneath the cache.
    ///
    /// The owning component should be rebuilt from scratch.
    #[error("Compilation backend lost: {0}")]
    BackendLost(#[source] BackendError),
}

impl VariantError {
    /// Whether the failure is local to one variant (expected class).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, VariantError::BackendLost(_))
    }

    /// Compiler log for a rejected variant.
    pub fn compile_log(&self) -> Option<&str> {
        match self {
            VariantError::Compilation { log, .. } => Some(log),
            _ => None,
        }
    }
}
