//! Phase state machine for a consensus run
//!
//! A run moves strictly forward through
//! `Thinking → Debate → Voting → Completed`. No phase is skipped and
//! none is revisited; [`PhaseMachine`] rejects any other move.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Phase of a consensus run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Each persona evaluates the prompt in isolation
    Thinking,
    /// Personas respond to each other's positions
    Debate,
    /// Personas cast votes on the compressed discussion
    Voting,
    /// Terminal state: the result record exists
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Thinking => "thinking",
            Phase::Debate => "debate",
            Phase::Voting => "voting",
            Phase::Completed => "completed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Thinking => "Independent Thinking",
            Phase::Debate => "Debate",
            Phase::Voting => "Voting",
            Phase::Completed => "Completed",
        }
    }

    /// The only phase reachable from this one, if any.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Thinking => Some(Phase::Debate),
            Phase::Debate => Some(Phase::Voting),
            Phase::Voting => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded move between two phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    /// Milliseconds since epoch
    pub timestamp: u64,
}

/// Tracks the current phase of one run and the transitions taken so far.
///
/// # Example
///
/// ```
/// use council_domain::{Phase, PhaseMachine};
///
/// let mut machine = PhaseMachine::new();
/// assert_eq!(machine.current(), Phase::Thinking);
///
/// machine.advance().unwrap();
/// assert_eq!(machine.current(), Phase::Debate);
/// assert!(machine.transition_to(Phase::Completed).is_err()); // no skipping
/// ```
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    current: Phase,
    history: Vec<PhaseTransition>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            current: Phase::Thinking,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn history(&self) -> &[PhaseTransition] {
        &self.history
    }

    /// Move to the successor of the current phase.
    pub fn advance(&mut self) -> Result<PhaseTransition, DomainError> {
        match self.current.next() {
            Some(next) => self.transition_to(next),
            None => Err(DomainError::InvalidTransition {
                from: self.current,
                to: self.current,
            }),
        }
    }

    /// Move to `to`, which must be the direct successor of the current phase.
    pub fn transition_to(&mut self, to: Phase) -> Result<PhaseTransition, DomainError> {
        if self.current.next() != Some(to) {
            return Err(DomainError::InvalidTransition {
                from: self.current,
                to,
            });
        }

        let transition = PhaseTransition {
            from: self.current,
            to,
            timestamp: current_timestamp(),
        };
        self.current = to;
        self.history.push(transition);
        Ok(transition)
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
