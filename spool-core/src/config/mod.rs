//! Configuration types for the share pool indexer.
//!
//! These types represent the validated runtime configuration and can be
//! shared across crates. The actual config loading/parsing is handled by the
//! server crate.

mod accounting;
mod chain;

pub use accounting::{AccountingConfig, InvariantPolicy};
pub use chain::ChainConfig;
