//! Building blocks of the consensus engine
//!
//! - [`ConcurrencyController`] - Admission gate for agent calls
//! - [`EventLog`] - Append-only, subscribable engine events
//! - [`StreamingEmitter`] - Bounded live output channel
//! - [`QuorumManager`] - Vote retry protocol and quorum decision

pub mod concurrency;
pub mod events;
pub mod quorum_manager;
pub mod streaming;

pub use concurrency::{ConcurrencyController, ConcurrencyError, ConcurrencyMetrics, ConcurrencyPermit};
pub use events::EventLog;
pub use quorum_manager::{
    ExclusionReason, PayloadContext, PersonaVoteReport, QuorumManager, QuorumOutcome,
};
pub use streaming::{EmitterStats, StreamingEmitter, StreamingError};
