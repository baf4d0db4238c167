//! Persona agent port
//!
//! One [`PersonaAgent`] answers for one persona in every phase. The
//! engine decides when and how concurrently the calls run; the agent only
//! knows how to produce each phase's output.

use super::llm_gateway::GatewayError;
use async_trait::async_trait;
use council_domain::{DebateRequest, DebateResult, Persona, ThinkingResult, VoteResult};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from a single agent call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Agent call timed out: {0}")]
    Timeout(String),

    /// The vote payload failed structural validation
    #[error("Schema validation failed: {}", .0.join("; "))]
    SchemaValidation(Vec<String>),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),
}

impl AgentError {
    pub fn is_schema_error(&self) -> bool {
        matches!(self, AgentError::SchemaValidation(_))
    }

    /// Validator errors, if this is a schema failure
    pub fn schema_errors(&self) -> Option<&[String]> {
        match self {
            AgentError::SchemaValidation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<GatewayError> for AgentError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout => AgentError::Timeout("gateway request".to_string()),
            GatewayError::ModelNotAvailable(m) => AgentError::Unavailable(m),
            other => AgentError::Transport(other.to_string()),
        }
    }
}

/// Sender for partial debate text
///
/// Each sender is tagged with its persona; the engine merges every
/// persona's deltas into one channel.
#[derive(Debug, Clone)]
pub struct DeltaSender {
    persona: Persona,
    tx: mpsc::UnboundedSender<(Persona, String)>,
}

impl DeltaSender {
    pub fn new(persona: Persona, tx: mpsc::UnboundedSender<(Persona, String)>) -> Self {
        Self { persona, tx }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Forward a chunk. Returns `false` once the receiver is gone.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.tx.send((self.persona, text.into())).is_ok()
    }
}

/// The reasoning agent behind one persona
#[async_trait]
pub trait PersonaAgent: Send + Sync {
    fn persona(&self) -> Persona;

    /// Evaluate the request in isolation.
    async fn think(&self, prompt: &str) -> Result<ThinkingResult, AgentError>;

    /// Respond to the other personas by name.
    ///
    /// Implementations may stream partial text through `deltas`.
    async fn debate(
        &self,
        request: &DebateRequest,
        deltas: Option<DeltaSender>,
    ) -> Result<DebateResult, AgentError>;

    /// Cast a vote on the (possibly compressed) discussion.
    async fn vote(&self, context: &str) -> Result<VoteResult, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_accessors() {
        let err = AgentError::SchemaValidation(vec!["a".into(), "b".into()]);
        assert!(err.is_schema_error());
        assert_eq!(err.schema_errors().unwrap().len(), 2);
        assert_eq!(err.to_string(), "Schema validation failed: a; b");
        assert!(!AgentError::Transport("x".into()).is_schema_error());
    }

    #[test]
    fn test_gateway_error_mapping() {
        assert!(matches!(
            AgentError::from(GatewayError::Timeout),
            AgentError::Timeout(_)
        ));
        assert!(matches!(
            AgentError::from(GatewayError::ConnectionError("refused".into())),
            AgentError::Transport(_)
        ));
    }

    #[test]
    fn test_delta_sender_tags_persona() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = DeltaSender::new(Persona::Advocate, tx);
        assert!(sender.send("hi"));
        assert_eq!(rx.try_recv().unwrap(), (Persona::Advocate, "hi".to_string()));
        drop(rx);
        assert!(!sender.send("gone"));
    }
}
