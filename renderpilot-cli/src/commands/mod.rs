//! Subcommand implementations.

pub mod benchmark;
pub mod common;
pub mod config;
pub mod load;
pub mod simulate;
