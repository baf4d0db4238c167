//! Orchestration value objects - immutable result types for a consensus run.
//!
//! These types represent the outputs of each phase:
//! - [`ThinkingResult`] - One persona's isolated evaluation of the prompt
//! - [`DebateResult`] / [`DebateRound`] - Responses to the other personas
//! - [`ConsensusResult`] - The terminal record of the whole run

use super::phase::current_timestamp;
use crate::context::token_budget::ReductionLog;
use crate::core::persona::Persona;
use crate::quorum::{Decision, VoteResult, VotingTally};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the Thinking phase for one persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingResult {
    pub persona: Persona,
    pub text: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
}

impl ThinkingResult {
    pub fn new(persona: Persona, text: impl Into<String>) -> Self {
        Self {
            persona,
            text: text.into(),
            timestamp: current_timestamp(),
        }
    }
}

/// One persona's responses to the others within a debate round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    pub persona: Persona,
    /// 1-based
    pub round: usize,
    /// Target persona -> response text
    pub responses: BTreeMap<Persona, String>,
    pub timestamp: u64,
}

impl DebateResult {
    pub fn new(persona: Persona, round: usize, responses: BTreeMap<Persona, String>) -> Self {
        Self {
            persona,
            round,
            responses,
            timestamp: current_timestamp(),
        }
    }

    /// All response texts joined, in target order
    pub fn combined_text(&self) -> String {
        self.responses
            .iter()
            .map(|(target, text)| format!("To {}: {}", target, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// All persona responses collected in a single debate round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    /// 1-based
    pub round: usize,
    pub results: BTreeMap<Persona, DebateResult>,
    pub timestamp: u64,
    /// Set when the round was cut short by the streaming token budget
    #[serde(default)]
    pub aborted: bool,
}

impl DebateRound {
    pub fn new(round: usize) -> Self {
        Self {
            round,
            results: BTreeMap::new(),
            timestamp: current_timestamp(),
            aborted: false,
        }
    }

    pub fn insert(&mut self, result: DebateResult) {
        self.results.insert(result.persona, result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Terminal record of a consensus run
///
/// Created once at the Voting → Completed transition (or by the quorum
/// fail-safe) and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub prompt: String,
    /// In persona enumeration order; failed personas are absent
    pub thinking_results: Vec<ThinkingResult>,
    pub debate_rounds: Vec<DebateRound>,
    /// Empty when the quorum fail-safe fired
    pub voting_results: BTreeMap<Persona, VoteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<VotingTally>,
    pub decision: Decision,
    pub exit_code: i32,
    /// Conditions of every conditional vote, in persona order
    pub conditions: Vec<String>,
    /// Personas excluded from quorum, sorted
    pub excluded: Vec<Persona>,
    pub partial_results: bool,
    pub fail_safe: bool,
    pub reductions: Vec<ReductionLog>,
}

impl ConsensusResult {
    /// Build the result of a run that reached quorum.
    pub fn decided(
        prompt: impl Into<String>,
        thinking_results: Vec<ThinkingResult>,
        debate_rounds: Vec<DebateRound>,
        voting_results: BTreeMap<Persona, VoteResult>,
        decision: Decision,
        excluded: Vec<Persona>,
        reductions: Vec<ReductionLog>,
    ) -> Self {
        let tally = VotingTally::from_votes(voting_results.values());
        let conditions = voting_results
            .values()
            .flat_map(|v| v.condition_list().iter().cloned())
            .collect();
        Self {
            prompt: prompt.into(),
            thinking_results,
            debate_rounds,
            voting_results,
            tally: Some(tally),
            decision,
            exit_code: decision.exit_code(),
            conditions,
            excluded,
            partial_results: false,
            fail_safe: false,
            reductions,
        }
    }

    /// Build the safe "denied" result used when quorum is not met.
    ///
    /// No vote, tally or condition is exposed.
    pub fn fail_safe(
        prompt: impl Into<String>,
        thinking_results: Vec<ThinkingResult>,
        debate_rounds: Vec<DebateRound>,
        excluded: Vec<Persona>,
        partial_results: bool,
        reductions: Vec<ReductionLog>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            thinking_results,
            debate_rounds,
            voting_results: BTreeMap::new(),
            tally: None,
            decision: Decision::Denied,
            exit_code: Decision::Denied.exit_code(),
            conditions: Vec::new(),
            excluded,
            partial_results,
            fail_safe: true,
            reductions,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decided_aggregates_conditions_in_persona_order() {
        let mut votes = BTreeMap::new();
        votes.insert(
            Persona::Advocate,
            VoteResult::conditional(Persona::Advocate, "ok", vec!["b".into()]),
        );
        votes.insert(
            Persona::Analyst,
            VoteResult::conditional(Persona::Analyst, "ok", vec!["a".into()]),
        );
        votes.insert(Persona::Skeptic, VoteResult::approve(Persona::Skeptic, "ok"));

        let result = ConsensusResult::decided(
            "q",
            vec![],
            vec![],
            votes,
            Decision::Conditional,
            vec![],
            vec![],
        );
        assert_eq!(result.conditions, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(result.exit_code, 2);
        assert_eq!(result.tally.unwrap().total(), 3);
    }

    #[test]
    fn test_fail_safe_exposes_no_votes() {
        let result = ConsensusResult::fail_safe(
            "q",
            vec![ThinkingResult::new(Persona::Analyst, "t")],
            vec![],
            vec![Persona::Advocate, Persona::Skeptic],
            true,
            vec![],
        );
        assert_eq!(result.decision, Decision::Denied);
        assert_eq!(result.exit_code, 1);
        assert!(result.voting_results.is_empty());
        assert!(result.tally.is_none());
        assert!(result.conditions.is_empty());
        assert!(result.fail_safe);
    }

    #[test]
    fn test_debate_combined_text() {
        let mut responses = BTreeMap::new();
        responses.insert(Persona::Skeptic, "too risky?".to_string());
        responses.insert(Persona::Analyst, "numbers check out".to_string());
        let result = DebateResult::new(Persona::Advocate, 1, responses);
        assert_eq!(
            result.combined_text(),
            "To analyst: numbers check out\n\nTo skeptic: too risky?"
        );
    }
}
