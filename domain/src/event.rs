//! Structured engine events
//!
//! Every observable step of a run (phase transitions, retries, drops,
//! fail-safe) is recorded as an [`EngineEvent`]. The serialized form is a
//! flat JSON object:
//!
//! ```json
//! {"type": "phase.transition", "from": "thinking", "to": "debate", "timestamp": 1700000000000}
//! ```

use crate::core::persona::Persona;
use crate::orchestration::phase::{Phase, current_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error code recorded when a persona exhausts its schema retries
pub const SCHEMA_RETRY_EXCEEDED_CODE: &str = "CONSENSUS_SCHEMA_RETRY_EXCEEDED";

/// Kind of engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "phase.transition")]
    PhaseTransition,
    #[serde(rename = "agent.error")]
    AgentError,
    #[serde(rename = "debate.streaming.aborted")]
    DebateStreamingAborted,
    #[serde(rename = "context.reduced")]
    ContextReduced,
    #[serde(rename = "schema.rejected")]
    SchemaRejected,
    #[serde(rename = "schema.retry")]
    SchemaRetry,
    #[serde(rename = "schema.retry_exhausted")]
    SchemaRetryExhausted,
    #[serde(rename = "quorum.fail_safe")]
    QuorumFailSafe,
    #[serde(rename = "streaming.drop")]
    StreamingDrop,
    #[serde(rename = "streaming.timeout")]
    StreamingTimeout,
    #[serde(rename = "streaming.failure")]
    StreamingFailure,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PhaseTransition => "phase.transition",
            EventType::AgentError => "agent.error",
            EventType::DebateStreamingAborted => "debate.streaming.aborted",
            EventType::ContextReduced => "context.reduced",
            EventType::SchemaRejected => "schema.rejected",
            EventType::SchemaRetry => "schema.retry",
            EventType::SchemaRetryExhausted => "schema.retry_exhausted",
            EventType::QuorumFailSafe => "quorum.fail_safe",
            EventType::StreamingDrop => "streaming.drop",
            EventType::StreamingTimeout => "streaming.timeout",
            EventType::StreamingFailure => "streaming.failure",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only audit record
///
/// # Example
///
/// ```
/// use council_domain::{EngineEvent, EventType, Phase};
///
/// let event = EngineEvent::phase_transition(Phase::Thinking, Phase::Debate);
/// assert_eq!(event.event_type, EventType::PhaseTransition);
/// assert_eq!(event.field("to"), Some(&serde_json::json!("debate")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Event-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Milliseconds since epoch
    pub timestamp: u64,
}

impl EngineEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            phase: None,
            persona: None,
            code: None,
            reason: None,
            extra: Map::new(),
            timestamp: current_timestamp(),
        }
    }

    pub fn phase_transition(from: Phase, to: Phase) -> Self {
        Self::new(EventType::PhaseTransition)
            .with_field("from", from.as_str())
            .with_field("to", to.as_str())
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn is(&self, event_type: EventType) -> bool {
        self.event_type == event_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat() {
        let event = EngineEvent::new(EventType::SchemaRetryExhausted)
            .with_phase(Phase::Voting)
            .with_persona(Persona::Skeptic)
            .with_code(SCHEMA_RETRY_EXCEEDED_CODE)
            .with_field("errors", json!(["missing required field `vote`"]));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "schema.retry_exhausted");
        assert_eq!(value["phase"], "voting");
        assert_eq!(value["persona"], "skeptic");
        assert_eq!(value["code"], "CONSENSUS_SCHEMA_RETRY_EXCEEDED");
        assert_eq!(value["errors"][0], "missing required field `vote`");
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn test_round_trip_keeps_extra_fields() {
        let event = EngineEvent::new(EventType::StreamingDrop)
            .with_reason("queue_full_oldest_normal")
            .with_field("dropped_total", 3);
        let text = serde_json::to_string(&event).unwrap();
        let back: EngineEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.field("dropped_total"), Some(&json!(3)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(EventType::QuorumFailSafe.as_str(), "quorum.fail_safe");
        assert_eq!(
            serde_json::to_value(EventType::DebateStreamingAborted).unwrap(),
            json!("debate.streaming.aborted")
        );
    }
}
