//! Streaming value objects
//!
//! - [`StreamEvent`] - One event of a streaming model response
//! - [`StreamChunk`] - A unit of output queued for the live sink
//! - [`OverflowPolicy`] - What the emitter does when its queue is full

use crate::core::error::DomainError;
use crate::core::persona::Persona;
use crate::orchestration::phase::current_timestamp;
use serde::{Deserialize, Serialize};

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) | StreamEvent::Completed(s) => Some(s),
            StreamEvent::Error(_) => None,
        }
    }
}

/// Priority of a queued chunk
///
/// Critical chunks (round boundaries, abort notices) survive overflow as
/// long as any normal chunk can be dropped instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPriority {
    #[default]
    Normal,
    Critical,
}

/// A unit of live output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: String,
    pub priority: ChunkPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<usize>,
    pub timestamp: u64,
}

impl StreamChunk {
    pub fn normal(text: impl Into<String>) -> Self {
        Self::with_priority(text, ChunkPriority::Normal)
    }

    pub fn critical(text: impl Into<String>) -> Self {
        Self::with_priority(text, ChunkPriority::Critical)
    }

    fn with_priority(text: impl Into<String>, priority: ChunkPriority) -> Self {
        Self {
            text: text.into(),
            priority,
            persona: None,
            round: None,
            timestamp: current_timestamp(),
        }
    }

    pub fn from_persona(mut self, persona: Persona, round: usize) -> Self {
        self.persona = Some(persona);
        self.round = Some(round);
        self
    }

    pub fn is_critical(&self) -> bool {
        self.priority == ChunkPriority::Critical
    }
}

/// Emitter behavior when the bounded queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Evict a chunk (oldest normal first) and keep going
    #[default]
    Drop,
    /// Make the producer wait for space, up to the emit timeout
    Backpressure,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Drop => "drop",
            OverflowPolicy::Backpressure => "backpressure",
        }
    }
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OverflowPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(OverflowPolicy::Drop),
            "backpressure" => Ok(OverflowPolicy::Backpressure),
            _ => Err(DomainError::UnknownOverflowPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_parse() {
        assert_eq!("drop".parse::<OverflowPolicy>().unwrap(), OverflowPolicy::Drop);
        assert_eq!(
            "Backpressure".parse::<OverflowPolicy>().unwrap(),
            OverflowPolicy::Backpressure
        );
        assert!(matches!(
            "block".parse::<OverflowPolicy>(),
            Err(DomainError::UnknownOverflowPolicy(_))
        ));
    }

    #[test]
    fn test_chunk_builders() {
        let chunk = StreamChunk::critical("round 2").from_persona(Persona::Skeptic, 2);
        assert!(chunk.is_critical());
        assert_eq!(chunk.persona, Some(Persona::Skeptic));
        assert_eq!(chunk.round, Some(2));
        assert!(!StreamChunk::normal("x").is_critical());
    }

    #[test]
    fn test_stream_event_text() {
        assert_eq!(StreamEvent::Delta("a".into()).text(), Some("a"));
        assert_eq!(StreamEvent::Error("e".into()).text(), None);
    }
}
