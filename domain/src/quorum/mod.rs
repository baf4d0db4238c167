//! Quorum consensus domain
//!
//! Voting primitives and the rules that turn ballots into a decision.
//!
//! # Decision Flow
//!
//! ```text
//! vote payload ──► schema::validate_vote_payload ──► VoteResult
//!                                                       │
//!                         QuorumState (exclusions) ◄────┤
//!                                                       ▼
//!                              VotingTally ──► ThresholdMode ──► Decision ──► exit code
//! ```
//!
//! Quorum failure never produces a partial decision: callers degrade to
//! [`Decision::Denied`] instead.

pub mod rule;
pub mod schema;
pub mod state;
pub mod vote;

// Re-export main types
pub use rule::{Decision, ThresholdMode, VotingTally};
pub use schema::{SchemaValidation, extract_vote_payload, parse_vote_payload, validate_vote_payload};
pub use state::QuorumState;
pub use vote::{Vote, VoteResult};
