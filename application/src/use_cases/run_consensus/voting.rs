//! Phase 3: Voting
//!
//! Builds one discussion document, keeps it within the token budget,
//! runs the vote retry protocol for every persona and applies the quorum
//! rule.

use super::ConsensusEngine;
use crate::consensus::{PayloadContext, QuorumManager, QuorumOutcome};
use council_domain::{
    ConsensusResult, DebateRound, EngineEvent, EventType, Phase, TemplateName, ThinkingResult,
    VotingTally,
};
use futures::future::join_all;
use tracing::{info, warn};

impl ConsensusEngine {
    pub(super) async fn phase_voting(
        &mut self,
        prompt: &str,
        thinking: Vec<ThinkingResult>,
        rounds: Vec<DebateRound>,
    ) -> ConsensusResult {
        info!("Phase 3: Voting");
        self.observer
            .on_phase_start(&Phase::Voting, self.agents.len());

        let context = self.voting_context();
        let template_version = self.templates.get_or_builtin(TemplateName::Vote).version;

        let reports = {
            let settings = self.config.quorum;
            let votes = self
                .agents
                .iter()
                .filter(|(persona, _)| !self.quorum.state().is_excluded(*persona))
                .map(|(_, agent)| {
                    let payload = PayloadContext::new(template_version.as_str());
                    let context = context.as_str();
                    let gate = &self.gate;
                    let events = &self.events;
                    async move {
                        QuorumManager::run_persona_vote(
                            &settings,
                            agent.as_ref(),
                            context,
                            gate,
                            payload,
                            events,
                        )
                        .await
                    }
                });
            join_all(votes).await
        };

        for report in &reports {
            self.observer
                .on_persona_complete(&Phase::Voting, report.persona, report.outcome.is_ok());
            self.quorum.record(report);
        }
        self.observer.on_phase_complete(&Phase::Voting);

        match self.quorum.evaluate() {
            QuorumOutcome::FailSafe {
                excluded,
                partial_results,
                success_count,
            } => {
                warn!(
                    success_count,
                    quorum_threshold = self.config.quorum.quorum_threshold,
                    "Quorum not met, decision denied"
                );
                self.events.record(
                    EngineEvent::new(EventType::QuorumFailSafe)
                        .with_phase(Phase::Voting)
                        .with_reason("quorum_not_met")
                        .with_field(
                            "excluded",
                            excluded.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                        )
                        .with_field("success_count", success_count)
                        .with_field("quorum_threshold", self.config.quorum.quorum_threshold)
                        .with_field("partial_results", partial_results),
                );
                self.transition(Phase::Completed);
                ConsensusResult::fail_safe(
                    prompt,
                    thinking,
                    rounds,
                    excluded,
                    partial_results,
                    self.reductions.clone(),
                )
            }
            QuorumOutcome::Reached { votes, excluded } => {
                let tally = VotingTally::from_votes(votes.values());
                let decision = tally.decide(self.config.quorum.threshold_mode);
                info!(
                    approve = tally.approve_count,
                    deny = tally.deny_count,
                    conditional = tally.conditional_count,
                    decision = %decision,
                    "Votes tallied"
                );
                self.transition(Phase::Completed);
                ConsensusResult::decided(
                    prompt,
                    thinking,
                    rounds,
                    votes,
                    decision,
                    excluded,
                    self.reductions.clone(),
                )
            }
        }
    }

    /// The discussion document every persona votes on, within budget.
    fn voting_context(&mut self) -> String {
        let outcome = self.budget.enforce(&self.context.voting_view(), Phase::Voting);

        if let Some(log) = outcome.reduction_log() {
            info!(
                reason = %log.reason,
                tokens_before = log.tokens_before,
                tokens_after = log.tokens_after,
                "Voting context reduced"
            );
            self.events.record(
                EngineEvent::new(EventType::ContextReduced)
                    .with_phase(Phase::Voting)
                    .with_reason(log.reason.as_str())
                    .with_field("tokens_before", log.tokens_before)
                    .with_field("tokens_after", log.tokens_after),
            );
            self.reductions.push(log);
        }

        outcome.text
    }
}
