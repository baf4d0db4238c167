//! Phase 2: Debate
//!
//! Rounds run sequentially; within a round every persona responds to the
//! other two concurrently. With streaming enabled, partial text flows
//! through the [`StreamingEmitter`] and the accumulated streamed text is
//! checked against the debate token budget. An overrun aborts the round
//! in flight and skips the remaining rounds.

use super::ConsensusEngine;
use crate::consensus::StreamingEmitter;
use crate::ports::agent::{AgentError, DeltaSender};
use council_domain::{
    DebateResult, DebateRound, EngineEvent, EventType, Persona, Phase, StreamChunk, TokenBudget,
    TokenBudgetManager,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

/// Running total of streamed debate text
struct StreamBudget {
    manager: TokenBudgetManager,
    streamed_chars: usize,
}

impl StreamBudget {
    fn tokens(&self) -> usize {
        self.manager.estimate_char_count(self.streamed_chars)
    }

    fn exceeded(&self) -> bool {
        self.tokens() > self.manager.max_tokens()
    }
}

impl ConsensusEngine {
    pub(super) async fn phase_debate(&mut self) -> Vec<DebateRound> {
        info!(rounds = self.config.debate_rounds, "Phase 2: Debate");

        let emitter = self.config.streaming.enabled.then(|| {
            StreamingEmitter::start(
                &self.config.streaming,
                self.stream_sink.clone(),
                self.events.clone(),
            )
        });
        let mut budget = StreamBudget {
            manager: TokenBudgetManager::new(TokenBudget {
                max_tokens: self.config.debate_stream_budget(),
                ..self.config.token_budget
            }),
            streamed_chars: 0,
        };

        let mut rounds = Vec::with_capacity(self.config.debate_rounds);

        for round in 1..=self.config.debate_rounds {
            info!(round, "Debate round starting");
            self.observer
                .on_phase_start(&Phase::Debate, self.agents.len());

            if let Some(emitter) = &emitter {
                self.emit(
                    emitter,
                    StreamChunk::critical(format!("--- Debate round {} ---", round)),
                )
                .await;
            }

            let record = self.run_round(round, emitter.as_ref(), &mut budget).await;
            for result in record.results.values() {
                self.context.record_debate(result);
            }
            let aborted = record.aborted;
            rounds.push(record);
            self.observer.on_phase_complete(&Phase::Debate);

            if aborted {
                self.streaming_aborted = true;
                warn!(round, "Debate truncated by streaming budget, skipping remaining rounds");
                break;
            }
        }

        if let Some(emitter) = emitter {
            if !emitter.flush(self.config.streaming.emit_timeout).await {
                debug!("Stream queue not drained before shutdown");
            }
            emitter.shutdown().await;
        }

        rounds
    }

    async fn run_round(
        &self,
        round: usize,
        emitter: Option<&StreamingEmitter>,
        budget: &mut StreamBudget,
    ) -> DebateRound {
        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<(Persona, String)>();
        let mut join_set = JoinSet::new();
        let mut tasks: HashMap<Id, Persona> = HashMap::new();

        for (persona, agent) in self.agents.iter() {
            let request = self.context.debate_view(persona, round);
            let gate = self.gate.clone();
            let deltas = emitter.map(|_| DeltaSender::new(persona, delta_tx.clone()));

            let handle = join_set.spawn(async move {
                let result = match gate.acquire().await {
                    Ok(_permit) => agent.debate(&request, deltas).await,
                    Err(e) => Err(AgentError::from(e)),
                };
                (persona, result)
            });
            tasks.insert(handle.id(), persona);
        }
        drop(delta_tx);

        let mut record = DebateRound::new(round);
        let mut deltas_open = true;

        loop {
            tokio::select! {
                delta = delta_rx.recv(), if deltas_open && !record.aborted => match delta {
                    Some((persona, text)) => {
                        if self.forward_delta(emitter, persona, round, text, budget).await {
                            self.abort_round(&mut join_set, &mut record, budget, emitter).await;
                        }
                    }
                    None => deltas_open = false,
                },
                joined = join_set.join_next() => match joined {
                    None => break,
                    Some(Ok((persona, Ok(result)))) => {
                        info!(persona = %persona, round, "Debate response complete");
                        self.observer.on_persona_complete(&Phase::Debate, persona, true);
                        record.insert(DebateResult {
                            persona,
                            round,
                            ..result
                        });
                    }
                    Some(Ok((persona, Err(e)))) => {
                        warn!(persona = %persona, round, error = %e, "Debate call failed");
                        self.observer.on_persona_complete(&Phase::Debate, persona, false);
                        self.record_agent_error(Phase::Debate, persona, &e.to_string());
                    }
                    Some(Err(e)) if e.is_cancelled() => {
                        debug!(round, "Debate call cancelled");
                    }
                    Some(Err(e)) => match tasks.get(&e.id()) {
                        Some(&persona) => {
                            warn!(persona = %persona, round, error = %e, "Debate task failed");
                            self.observer.on_persona_complete(&Phase::Debate, persona, false);
                            self.record_agent_error(Phase::Debate, persona, &e.to_string());
                        }
                        None => warn!("Task join error: {}", e),
                    },
                },
            }
        }

        // Deltas sent just before their call returned
        while !record.aborted {
            let Ok((persona, text)) = delta_rx.try_recv() else {
                break;
            };
            if self.forward_delta(emitter, persona, round, text, budget).await {
                self.abort_round(&mut join_set, &mut record, budget, emitter).await;
            }
        }

        record
    }

    /// Queue one delta and account for it. Returns `true` on budget overrun.
    async fn forward_delta(
        &self,
        emitter: Option<&StreamingEmitter>,
        persona: Persona,
        round: usize,
        text: String,
        budget: &mut StreamBudget,
    ) -> bool {
        budget.streamed_chars += text.chars().count();
        if let Some(emitter) = emitter {
            self.emit(emitter, StreamChunk::normal(text).from_persona(persona, round))
                .await;
        }
        budget.exceeded()
    }

    async fn abort_round(
        &self,
        join_set: &mut JoinSet<(Persona, Result<DebateResult, AgentError>)>,
        record: &mut DebateRound,
        budget: &StreamBudget,
        emitter: Option<&StreamingEmitter>,
    ) {
        join_set.abort_all();
        record.aborted = true;

        let tokens = budget.tokens();
        let max_tokens = budget.manager.max_tokens();
        warn!(round = record.round, tokens, max_tokens, "Debate streaming budget exceeded");
        self.events.record(
            EngineEvent::new(EventType::DebateStreamingAborted)
                .with_phase(Phase::Debate)
                .with_reason("token_budget_exceeded")
                .with_field("round", record.round)
                .with_field("tokens", tokens)
                .with_field("max_tokens", max_tokens),
        );

        if let Some(emitter) = emitter {
            self.emit(
                emitter,
                StreamChunk::critical(format!(
                    "--- Debate round {} aborted: token budget exceeded ---",
                    record.round
                )),
            )
            .await;
        }
    }

    /// Emit a chunk; failures are recorded, never fatal.
    async fn emit(&self, emitter: &StreamingEmitter, chunk: StreamChunk) {
        if let Err(e) = emitter.emit(chunk).await {
            warn!(error = %e, "Streaming failure during debate");
            self.events.record(
                EngineEvent::new(EventType::StreamingFailure)
                    .with_phase(Phase::Debate)
                    .with_reason(e.to_string()),
            );
        }
    }
}
