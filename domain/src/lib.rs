//! Domain layer for persona-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! Three fixed [`Persona`]s evaluate a request independently, argue about
//! each other's positions and then vote:
//!
//! - **Thinking**: each persona sees only the request
//! - **Debate**: each persona responds to the other two by name
//! - **Voting**: each persona casts APPROVE / DENY / CONDITIONAL
//!
//! ## Quorum
//!
//! A [`VotingTally`] is converted into a [`Decision`] by a [`ThresholdMode`].
//! When too few personas produce a valid vote the run fails safe to
//! [`Decision::Denied`].

pub mod config;
pub mod context;
pub mod core;
pub mod event;
pub mod orchestration;
pub mod prompt;
pub mod quorum;
pub mod streaming;

// Re-export commonly used types
pub use config::OutputFormat;
pub use context::{
    BudgetOutcome, ContextEntry, ContextManager, DebateRequest, EntryKind, ReductionLog,
    ReductionReason, TokenBudget, TokenBudgetManager,
};
pub use crate::core::{error::DomainError, persona::Persona};
pub use event::{EngineEvent, EventType, SCHEMA_RETRY_EXCEEDED_CODE};
pub use orchestration::{
    phase::{Phase, PhaseMachine, PhaseTransition},
    value_objects::{ConsensusResult, DebateResult, DebateRound, ThinkingResult},
};
pub use prompt::{BUILTIN_TEMPLATE_VERSION, PromptTemplate, TemplateName, parse_debate_sections};
pub use quorum::{
    Decision, QuorumState, SchemaValidation, ThresholdMode, Vote, VoteResult, VotingTally,
    extract_vote_payload, parse_vote_payload, validate_vote_payload,
};
pub use streaming::{ChunkPriority, OverflowPolicy, StreamChunk, StreamEvent};
