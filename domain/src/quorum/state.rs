//! Quorum bookkeeping for the Voting phase

use crate::core::persona::Persona;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which personas still count toward quorum in the current run
///
/// `alive_count` starts at the number of configured personas and only
/// decreases as personas are excluded, so it can never exceed that count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumState {
    pub alive_count: usize,
    pub quorum_threshold: usize,
    /// Outer (non-schema) retries granted to each persona
    pub retries_left: usize,
    pub excluded: BTreeSet<Persona>,
    pub partial_results: bool,
}

impl QuorumState {
    pub fn new(total_agents: usize, quorum_threshold: usize, retries: usize) -> Self {
        Self {
            alive_count: total_agents,
            quorum_threshold,
            retries_left: retries,
            excluded: BTreeSet::new(),
            partial_results: false,
        }
    }

    /// Permanently exclude `persona` for the rest of this run.
    ///
    /// Returns `false` if it was already excluded.
    pub fn exclude(&mut self, persona: Persona) -> bool {
        if self.excluded.insert(persona) {
            self.alive_count = self.alive_count.saturating_sub(1);
            true
        } else {
            false
        }
    }

    pub fn is_excluded(&self, persona: Persona) -> bool {
        self.excluded.contains(&persona)
    }

    pub fn has_quorum(&self) -> bool {
        self.alive_count >= self.quorum_threshold
    }

    /// Excluded personas sorted by name
    pub fn excluded_sorted(&self) -> Vec<Persona> {
        let mut excluded: Vec<Persona> = self.excluded.iter().copied().collect();
        excluded.sort_by_key(|p| p.as_str());
        excluded
    }
}
