//! Types for the consensus engine use case

use crate::ports::agent::PersonaAgent;
use council_domain::{DomainError, Persona};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building an engine
///
/// Running an engine never fails: `execute` always yields a result.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] DomainError),

    #[error("No agent configured for persona {0}")]
    MissingAgent(Persona),

    #[error("More than one agent configured for persona {0}")]
    DuplicateAgent(Persona),
}

/// Exactly one agent per persona
#[derive(Clone)]
pub struct PersonaAgents {
    agents: BTreeMap<Persona, Arc<dyn PersonaAgent>>,
}

impl PersonaAgents {
    pub fn new(agents: Vec<Arc<dyn PersonaAgent>>) -> Result<Self, EngineError> {
        let mut map = BTreeMap::new();
        for agent in agents {
            let persona = agent.persona();
            if map.insert(persona, agent).is_some() {
                return Err(EngineError::DuplicateAgent(persona));
            }
        }
        if let Some(missing) = Persona::ALL.iter().find(|p| !map.contains_key(p)) {
            return Err(EngineError::MissingAgent(*missing));
        }
        Ok(Self { agents: map })
    }

    /// Agents in persona enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (Persona, Arc<dyn PersonaAgent>)> + '_ {
        self.agents.iter().map(|(p, a)| (*p, Arc::clone(a)))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for PersonaAgents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.agents.keys()).finish()
    }
}
