//! Application-level configuration.
//!
//! - [`EngineConfig`]: everything the consensus engine reads during a run

pub mod engine_config;

pub use engine_config::{ConcurrencySettings, EngineConfig, QuorumSettings, StreamingSettings};
