//! Quorum Manager
//!
//! Drives the per-persona vote retry protocol and decides whether enough
//! valid votes exist to trust a decision.
//!
//! # Retry protocol
//!
//! Two independent bounded counters per persona:
//!
//! - **outer attempts**: up to `1 + retry_count`; consumed by transport
//!   failures, timeouts and concurrency acquire timeouts
//! - **schema retries**: up to `schema_retry_count` after a schema
//!   rejection; never consume an outer attempt
//!
//! Exhausting either counter excludes the persona from quorum for the rest
//! of the run.
//!
//! # Fail-safe
//!
//! With fewer than `quorum_threshold` valid votes the run is denied. No
//! partial vote is ever reported as a decision.

use super::concurrency::ConcurrencyController;
use super::events::EventLog;
use crate::config::QuorumSettings;
use crate::ports::agent::{AgentError, PersonaAgent};
use council_domain::{
    EngineEvent, EventType, Persona, Phase, QuorumState, SCHEMA_RETRY_EXCEEDED_CODE, VoteResult,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a persona lost its vote
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    /// Every schema retry was rejected; carries the last validator errors
    SchemaRetryExhausted { errors: Vec<String> },
    /// Every outer attempt failed; carries the last error message
    RetriesExhausted { last_error: String },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::SchemaRetryExhausted { errors } => {
                write!(f, "schema retries exhausted: {}", errors.join("; "))
            }
            ExclusionReason::RetriesExhausted { last_error } => {
                write!(f, "retries exhausted: {}", last_error)
            }
        }
    }
}

/// Audit correlation for one persona's vote payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadContext {
    pub payload_id: String,
    pub template_version: String,
}

impl PayloadContext {
    pub fn new(template_version: impl Into<String>) -> Self {
        Self {
            payload_id: Uuid::new_v4().to_string(),
            template_version: template_version.into(),
        }
    }
}

/// Result of the retry protocol for one persona
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaVoteReport {
    pub persona: Persona,
    pub outcome: Result<VoteResult, ExclusionReason>,
    /// Outer attempts started
    pub attempts: usize,
    /// Vote calls rejected by schema validation
    pub schema_rejections: usize,
    pub payload: PayloadContext,
}

/// Final quorum verdict for a run
#[derive(Debug, Clone, PartialEq)]
pub enum QuorumOutcome {
    Reached {
        votes: BTreeMap<Persona, VoteResult>,
        excluded: Vec<Persona>,
    },
    FailSafe {
        excluded: Vec<Persona>,
        partial_results: bool,
        success_count: usize,
    },
}

impl QuorumOutcome {
    pub fn is_fail_safe(&self) -> bool {
        matches!(self, QuorumOutcome::FailSafe { .. })
    }
}

/// Tracks vote results and exclusions for one run
#[derive(Debug, Clone)]
pub struct QuorumManager {
    settings: QuorumSettings,
    total_agents: usize,
    state: QuorumState,
    votes: BTreeMap<Persona, VoteResult>,
}

impl QuorumManager {
    pub fn new(total_agents: usize, settings: QuorumSettings) -> Self {
        Self {
            settings,
            total_agents,
            state: QuorumState::new(total_agents, settings.quorum_threshold, settings.retry_count),
            votes: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &QuorumSettings {
        &self.settings
    }

    pub fn state(&self) -> &QuorumState {
        &self.state
    }

    /// Forget the previous run.
    pub fn reset(&mut self) {
        self.state = QuorumState::new(
            self.total_agents,
            self.settings.quorum_threshold,
            self.settings.retry_count,
        );
        self.votes.clear();
    }

    /// Run the retry protocol for one persona.
    pub async fn run_persona_vote(
        settings: &QuorumSettings,
        agent: &dyn PersonaAgent,
        context: &str,
        gate: &ConcurrencyController,
        payload: PayloadContext,
        events: &EventLog,
    ) -> PersonaVoteReport {
        let persona = agent.persona();
        let max_attempts = 1 + settings.retry_count;
        let mut attempts = 0;
        let mut schema_rejections = 0;
        let mut schema_retries_used = 0;
        let mut last_error = String::new();

        'outer: while attempts < max_attempts {
            attempts += 1;
            debug!(persona = %persona, attempt = attempts, "Requesting vote");

            loop {
                let permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        last_error = e.to_string();
                        warn!(persona = %persona, attempt = attempts, error = %e, "Vote slot unavailable");
                        events.record(agent_error(persona, attempts, &last_error));
                        continue 'outer;
                    }
                };
                let result = agent.vote(context).await;
                drop(permit);

                match result {
                    Ok(vote) => {
                        info!(persona = %persona, vote = %vote.vote, attempts, "Vote accepted");
                        return PersonaVoteReport {
                            persona,
                            outcome: Ok(vote),
                            attempts,
                            schema_rejections,
                            payload,
                        };
                    }
                    Err(AgentError::SchemaValidation(errors)) => {
                        schema_rejections += 1;
                        warn!(
                            persona = %persona,
                            payload_id = %payload.payload_id,
                            attempt = schema_rejections,
                            "Vote payload rejected by schema"
                        );
                        events.record(
                            schema_event(EventType::SchemaRejected, persona, &payload)
                                .with_field("attempt", schema_rejections)
                                .with_field("errors", errors.clone()),
                        );

                        if schema_retries_used >= settings.schema_retry_count {
                            events.record(
                                schema_event(EventType::SchemaRetryExhausted, persona, &payload)
                                    .with_code(SCHEMA_RETRY_EXCEEDED_CODE)
                                    .with_field("attempts", schema_rejections)
                                    .with_field("errors", errors.clone()),
                            );
                            return PersonaVoteReport {
                                persona,
                                outcome: Err(ExclusionReason::SchemaRetryExhausted { errors }),
                                attempts,
                                schema_rejections,
                                payload,
                            };
                        }

                        schema_retries_used += 1;
                        events.record(
                            schema_event(EventType::SchemaRetry, persona, &payload)
                                .with_field("attempt", schema_rejections + 1)
                                .with_field("retries_left", settings.schema_retry_count - schema_retries_used),
                        );
                    }
                    Err(e) => {
                        last_error = e.to_string();
                        warn!(persona = %persona, attempt = attempts, error = %e, "Vote call failed");
                        events.record(agent_error(persona, attempts, &last_error));
                        continue 'outer;
                    }
                }
            }
        }

        PersonaVoteReport {
            persona,
            outcome: Err(ExclusionReason::RetriesExhausted { last_error }),
            attempts,
            schema_rejections,
            payload,
        }
    }

    /// Record a persona's final outcome.
    pub fn record(&mut self, report: &PersonaVoteReport) {
        match &report.outcome {
            Ok(vote) => {
                self.votes.insert(report.persona, vote.clone());
            }
            Err(reason) => {
                if self.state.exclude(report.persona) {
                    warn!(persona = %report.persona, reason = %reason, "Persona excluded from quorum");
                }
            }
        }
    }

    pub fn success_count(&self) -> usize {
        self.votes.len()
    }

    /// Decide whether quorum is met.
    pub fn evaluate(&mut self) -> QuorumOutcome {
        let success_count = self.success_count();
        let excluded = self.state.excluded_sorted();

        if success_count < self.settings.quorum_threshold {
            let partial_results = success_count > 0 && success_count < self.total_agents;
            self.state.partial_results = partial_results;
            warn!(
                success_count,
                quorum_threshold = self.settings.quorum_threshold,
                "Quorum not met, failing safe"
            );
            QuorumOutcome::FailSafe {
                excluded,
                partial_results,
                success_count,
            }
        } else {
            QuorumOutcome::Reached {
                votes: self.votes.clone(),
                excluded,
            }
        }
    }
}

fn agent_error(persona: Persona, attempt: usize, message: &str) -> EngineEvent {
    EngineEvent::new(EventType::AgentError)
        .with_phase(Phase::Voting)
        .with_persona(persona)
        .with_reason(message)
        .with_field("attempt", attempt)
}

fn schema_event(event_type: EventType, persona: Persona, payload: &PayloadContext) -> EngineEvent {
    EngineEvent::new(event_type)
        .with_phase(Phase::Voting)
        .with_persona(persona)
        .with_field("payload_id", payload.payload_id.as_str())
        .with_field("template_version", payload.template_version.as_str())
}
