//! Source specialization.
//!
//! A specialized source is the base source with a block of preprocessor
//! definitions inserted at a single canonical injection point: directly after
//! the `#version` directive when the source starts with one (the directive
//! must stay first), otherwise at the very top.

use std::fmt::Write;

use crate::features::{Feature, FeatureConfiguration, QualityLevel};

/// Build the definition block for a configuration.
///
/// One `ENABLE_*` flag per capability and a one-hot `QUALITY_*` constant per
/// level, always in canonical order so equal configurations produce
/// byte-identical blocks.
pub fn definition_block(config: &FeatureConfiguration) -> String {
    let mut block = String::with_capacity(512);
    // Writing to a String cannot fail.
    let _ = writeln!(block, "// renderpilot variant {}", config.key());
    for feature in Feature::ALL {
        let _ = writeln!(
            block,
            "#define {} {}",
            feature.define_name(),
            u8::from(config.is_enabled(feature))
        );
    }
    for level in QualityLevel::ALL {
        let _ = writeln!(
            block,
            "#define {} {}",
            level.define_name(),
            u8::from(config.quality() == level)
        );
    }
    block
}

/// Insert the definition block for `config` into `base`.
pub fn specialize(base: &str, config: &FeatureConfiguration) -> String {
    let block = definition_block(config);
    let split = injection_offset(base);

    let mut source = String::with_capacity(base.len() + block.len() + 1);
    source.push_str(&base[..split]);
    if split > 0 && !base[..split].ends_with('\n') {
        source.push('\n');
    }
    source.push_str(&block);
    source.push_str(&base[split..]);
    source
}

/// Byte offset where definitions go.
fn injection_offset(base: &str) -> usize {
    let leading_ws = base.len() - base.trim_start().len();
    let rest = &base[leading_ws..];
    if !rest.starts_with("#version") {
        return 0;
    }
    match rest.find('\n') {
        Some(newline) => leading_ws + newline + 1,
        None => base.len(),
    }
}
