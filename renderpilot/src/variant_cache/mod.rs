//! Compiled program variant cache.
//!
//! Specialized programs are expensive to build and the same handful of
//! configurations come up again and again (every preset switch, every
//! loader run). The cache compiles each distinct [`FeatureConfiguration`]
//! at most once and hands out shared references afterwards.
//!
//! # Lookup Flow
//!
//! ```text
//! get_or_compile(base, config)
//!        │
//!        ▼
//!   config.key() ──hit──► Arc<CompiledVariant> (same allocation every time)
//!        │
//!       miss
//!        ▼
//!   specialize(base, config) ──► backend.compile() ──ok──► store + return
//!                                        │
//!                                      rejected ──► nothing stored, log kept,
//!                                                  Err(Compilation)
//! ```
//!
//! [`FeatureConfiguration`]: crate::features::FeatureConfiguration

mod cache;
mod error;
pub mod source;

pub use cache::{CompiledVariant, VariantCache, VariantCacheConfig, VariantCacheStats};
pub use error::VariantError;
