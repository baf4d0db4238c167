//! Vote types for persona consensus
//!
//! This module defines the core voting primitives used in the Voting phase.

use crate::core::persona::Persona;
use serde::{Deserialize, Serialize};

/// A persona's ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vote {
    Approve,
    Deny,
    Conditional,
}

impl Vote {
    /// Wire name used in vote payloads (`APPROVE`, `DENY`, `CONDITIONAL`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Approve => "APPROVE",
            Vote::Deny => "DENY",
            Vote::Conditional => "CONDITIONAL",
        }
    }
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVE" => Ok(Vote::Approve),
            "DENY" => Ok(Vote::Deny),
            "CONDITIONAL" => Ok(Vote::Conditional),
            other => Err(format!(
                "vote must be one of APPROVE, DENY, CONDITIONAL (got {:?})",
                other
            )),
        }
    }
}

/// A single persona's vote with its justification
///
/// # Example
///
/// ```
/// use council_domain::{Persona, Vote, VoteResult};
///
/// let vote = VoteResult::conditional(
///     Persona::Skeptic,
///     "Acceptable once observability exists",
///     vec!["add monitoring".to_string()],
/// );
/// assert_eq!(vote.vote, Vote::Conditional);
/// assert_eq!(vote.conditions.as_deref(), Some(&["add monitoring".to_string()][..]));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteResult {
    pub persona: Persona,
    pub vote: Vote,
    pub reason: String,
    /// Only populated for [`Vote::Conditional`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
    /// Self-reported confidence (0.0 to 1.0), if supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl VoteResult {
    pub fn approve(persona: Persona, reason: impl Into<String>) -> Self {
        Self {
            persona,
            vote: Vote::Approve,
            reason: reason.into(),
            conditions: None,
            confidence: None,
        }
    }

    pub fn deny(persona: Persona, reason: impl Into<String>) -> Self {
        Self {
            persona,
            vote: Vote::Deny,
            reason: reason.into(),
            conditions: None,
            confidence: None,
        }
    }

    /// Create a conditional vote.
    ///
    /// Blank condition strings are dropped; if nothing remains the
    /// condition list is left empty rather than absent.
    pub fn conditional(persona: Persona, reason: impl Into<String>, conditions: Vec<String>) -> Self {
        let conditions = conditions
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self {
            persona,
            vote: Vote::Conditional,
            reason: reason.into(),
            conditions: Some(conditions),
            confidence: None,
        }
    }

    /// Add confidence level to the vote
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Conditions attached to this vote (empty unless conditional)
    pub fn condition_list(&self) -> &[String] {
        match (&self.vote, &self.conditions) {
            (Vote::Conditional, Some(conditions)) => conditions,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_wire_names() {
        assert_eq!("APPROVE".parse::<Vote>().ok(), Some(Vote::Approve));
        assert_eq!("DENY".parse::<Vote>().ok(), Some(Vote::Deny));
        assert_eq!("CONDITIONAL".parse::<Vote>().ok(), Some(Vote::Conditional));
        assert!("approve".parse::<Vote>().is_err());
        assert_eq!(
            serde_json::to_string(&Vote::Conditional).unwrap(),
            "\"CONDITIONAL\""
        );
    }

    #[test]
    fn test_conditional_drops_blank_conditions() {
        let vote = VoteResult::conditional(
            Persona::Analyst,
            "ok",
            vec!["  add monitoring ".to_string(), "   ".to_string()],
        );
        assert_eq!(vote.condition_list(), ["add monitoring".to_string()]);
    }

    #[test]
    fn test_non_conditional_has_no_conditions() {
        let vote = VoteResult::approve(Persona::Advocate, "ship it");
        assert!(vote.conditions.is_none());
        assert!(vote.condition_list().is_empty());
    }

    #[test]
    fn test_confidence_clamped() {
        let vote = VoteResult::deny(Persona::Skeptic, "no").with_confidence(1.7);
        assert_eq!(vote.confidence, Some(1.0));
    }
}
