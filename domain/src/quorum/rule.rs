//! Decision rules for the Voting phase
//!
//! [`VotingTally`] counts ballots and [`ThresholdMode`] turns the counts
//! into a [`Decision`].

use super::vote::{Vote, VoteResult};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Rule for converting a tally into a decision
///
/// # Example
///
/// ```
/// use council_domain::{Decision, ThresholdMode, VotingTally};
///
/// let tally = VotingTally::new(2, 1, 0);
/// assert_eq!(tally.decide(ThresholdMode::Majority), Decision::Approved);
/// assert_eq!(tally.decide(ThresholdMode::Unanimous), Decision::Denied);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// `floor(total / 2) + 1` matching votes decide
    #[default]
    Majority,
    /// Every vote must approve
    Unanimous,
}

impl ThresholdMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMode::Majority => "majority",
            ThresholdMode::Unanimous => "unanimous",
        }
    }
}

impl std::fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThresholdMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majority" => Ok(ThresholdMode::Majority),
            "unanimous" => Ok(ThresholdMode::Unanimous),
            _ => Err(DomainError::UnknownThresholdMode(s.to_string())),
        }
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
    Conditional,
}

impl Decision {
    /// Process exit code surfaced to callers
    pub fn exit_code(&self) -> i32 {
        match self {
            Decision::Approved => 0,
            Decision::Denied => 1,
            Decision::Conditional => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
            Decision::Conditional => "conditional",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ballot counts for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VotingTally {
    pub approve_count: usize,
    pub deny_count: usize,
    pub conditional_count: usize,
}

impl VotingTally {
    pub fn new(approve_count: usize, deny_count: usize, conditional_count: usize) -> Self {
        Self {
            approve_count,
            deny_count,
            conditional_count,
        }
    }

    /// Count the ballots in `votes`
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a VoteResult>) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            match vote.vote {
                Vote::Approve => tally.approve_count += 1,
                Vote::Deny => tally.deny_count += 1,
                Vote::Conditional => tally.conditional_count += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.approve_count + self.deny_count + self.conditional_count
    }

    /// Apply `mode` to these counts
    pub fn decide(&self, mode: ThresholdMode) -> Decision {
        let total = self.total();
        match mode {
            ThresholdMode::Unanimous => {
                if total > 0 && self.approve_count == total {
                    Decision::Approved
                } else if self.deny_count >= 1 {
                    Decision::Denied
                } else {
                    Decision::Conditional
                }
            }
            ThresholdMode::Majority => {
                if total == 0 {
                    return Decision::Conditional;
                }
                let needed = total / 2 + 1;
                if self.approve_count >= needed {
                    Decision::Approved
                } else if self.deny_count >= needed {
                    Decision::Denied
                } else {
                    Decision::Conditional
                }
            }
        }
    }

    /// Generate a visual vote summary (e.g., "[++?-]")
    pub fn summary(&self) -> String {
        format!(
            "[{}{}{}]",
            "+".repeat(self.approve_count),
            "?".repeat(self.conditional_count),
            "-".repeat(self.deny_count)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persona::Persona;

    #[test]
    fn test_majority_examples() {
        let mode = ThresholdMode::Majority;
        assert_eq!(VotingTally::new(2, 1, 0).decide(mode), Decision::Approved);
        assert_eq!(VotingTally::new(1, 2, 0).decide(mode), Decision::Denied);
        assert_eq!(VotingTally::new(1, 1, 1).decide(mode), Decision::Conditional);
        assert_eq!(VotingTally::new(2, 0, 1).decide(mode), Decision::Approved);
    }

    #[test]
    fn test_majority_exhaustive_small_totals() {
        for total in 0..=6usize {
            for a in 0..=total {
                for d in 0..=(total - a) {
                    let c = total - a - d;
                    let decision = VotingTally::new(a, d, c).decide(ThresholdMode::Majority);
                    let needed = total / 2 + 1;
                    let expected = if total == 0 {
                        Decision::Conditional
                    } else if a >= needed {
                        Decision::Approved
                    } else if d >= needed {
                        Decision::Denied
                    } else {
                        Decision::Conditional
                    };
                    assert_eq!(decision, expected, "({}, {}, {})", a, d, c);
                }
            }
        }
    }

    #[test]
    fn test_unanimous_examples() {
        let mode = ThresholdMode::Unanimous;
        assert_eq!(VotingTally::new(3, 0, 0).decide(mode), Decision::Approved);
        assert_eq!(VotingTally::new(2, 1, 0).decide(mode), Decision::Denied);
        assert_eq!(VotingTally::new(2, 0, 1).decide(mode), Decision::Conditional);
        assert_eq!(VotingTally::new(0, 0, 0).decide(mode), Decision::Conditional);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Decision::Approved.exit_code(), 0);
        assert_eq!(Decision::Denied.exit_code(), 1);
        assert_eq!(Decision::Conditional.exit_code(), 2);
    }

    #[test]
    fn test_unknown_mode_is_error() {
        assert_eq!(
            "unanimous".parse::<ThresholdMode>().ok(),
            Some(ThresholdMode::Unanimous)
        );
        assert!(matches!(
            "supermajority".parse::<ThresholdMode>(),
            Err(DomainError::UnknownThresholdMode(_))
        ));
    }

    #[test]
    fn test_tally_counts_sum_to_votes() {
        let votes = vec![
            VoteResult::approve(Persona::Analyst, "yes"),
            VoteResult::conditional(Persona::Skeptic, "maybe", vec!["x".into()]),
            VoteResult::deny(Persona::Advocate, "no"),
        ];
        let tally = VotingTally::from_votes(&votes);
        assert_eq!(tally.total(), votes.len());
        assert_eq!(tally.summary(), "[+?-]");
    }
}
