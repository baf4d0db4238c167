//! Phase 1: Thinking
//!
//! Each persona evaluates the request in isolation. The only input is
//! the context manager's thinking view, which holds nothing but the
//! request.

use super::ConsensusEngine;
use crate::ports::agent::AgentError;
use council_domain::{Persona, Phase, ThinkingResult};
use std::collections::{BTreeMap, HashMap};
use tokio::task::{Id, JoinSet};
use tracing::{info, warn};

impl ConsensusEngine {
    pub(super) async fn phase_thinking(&mut self) -> Vec<ThinkingResult> {
        info!("Phase 1: Thinking");
        self.observer
            .on_phase_start(&Phase::Thinking, self.agents.len());

        let prompt = self.context.thinking_view();
        let mut join_set = JoinSet::new();
        let mut tasks: HashMap<Id, Persona> = HashMap::new();

        for (persona, agent) in self.agents.iter() {
            let gate = self.gate.clone();
            let prompt = prompt.clone();

            let handle = join_set.spawn(async move {
                let result = match gate.acquire().await {
                    Ok(_permit) => agent.think(&prompt).await,
                    Err(e) => Err(AgentError::from(e)),
                };
                (persona, result)
            });
            tasks.insert(handle.id(), persona);
        }

        let mut results: BTreeMap<Persona, ThinkingResult> = BTreeMap::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((persona, Ok(result))) => {
                    info!(persona = %persona, "Thinking complete");
                    self.observer
                        .on_persona_complete(&Phase::Thinking, persona, true);
                    results.insert(
                        persona,
                        ThinkingResult {
                            persona,
                            ..result
                        },
                    );
                }
                Ok((persona, Err(e))) => {
                    warn!(persona = %persona, error = %e, "Thinking failed");
                    self.observer
                        .on_persona_complete(&Phase::Thinking, persona, false);
                    self.record_agent_error(Phase::Thinking, persona, &e.to_string());
                }
                Err(e) => match tasks.get(&e.id()) {
                    Some(&persona) => {
                        warn!(persona = %persona, error = %e, "Thinking task failed");
                        self.observer
                            .on_persona_complete(&Phase::Thinking, persona, false);
                        self.record_agent_error(Phase::Thinking, persona, &e.to_string());
                    }
                    None => warn!("Task join error: {}", e),
                },
            }
        }

        let results: Vec<ThinkingResult> = results.into_values().collect();
        for result in &results {
            self.context.record_thinking(result);
        }

        self.observer.on_phase_complete(&Phase::Thinking);
        results
    }
}
