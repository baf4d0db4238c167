//! Consensus orchestration domain
//!
//! The phase state machine and the immutable records each phase produces.

pub mod phase;
pub mod value_objects;
