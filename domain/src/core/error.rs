//! Domain error types

use crate::orchestration::phase::Phase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("Unknown threshold mode: {0}. Valid: majority, unanimous")]
    UnknownThresholdMode(String),

    #[error("Unknown overflow policy: {0}. Valid: drop, backpressure")]
    UnknownOverflowPolicy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Check if this error comes from configuration rather than runtime state
    pub fn is_config_error(&self) -> bool {
        !matches!(self, DomainError::InvalidTransition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::InvalidTransition {
            from: Phase::Completed,
            to: Phase::Thinking,
        };
        assert_eq!(
            error.to_string(),
            "Invalid phase transition: completed -> thinking"
        );
        assert!(!error.is_config_error());
    }

    #[test]
    fn test_config_errors() {
        assert!(DomainError::UnknownThresholdMode("most".to_string()).is_config_error());
        assert!(DomainError::InvalidConfig("x".to_string()).is_config_error());
    }
}
