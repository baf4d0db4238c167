//! Phase-scoped shared context for a consensus run.
//!
//! The [`ContextManager`] records every artifact of a run (the request,
//! thinking outputs and debate responses) and hands each phase a view
//! containing only what that phase is allowed to see:
//!
//! | Phase | View |
//! |-------|------|
//! | Thinking | the request only |
//! | Debate round *n* | the request, the *other* personas' thinking, their round *n-1* responses |
//! | Voting | everything, rendered as one document |

use crate::core::persona::Persona;
use crate::orchestration::phase::Phase;
use crate::orchestration::value_objects::{DebateResult, ThinkingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a [`ContextEntry`] records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    Request,
    Thinking { persona: Persona },
    Debate { persona: Persona, round: usize, target: Persona },
}

/// One phase-tagged artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub phase: Phase,
    #[serde(flatten)]
    pub kind: EntryKind,
    pub text: String,
}

/// Input handed to a persona for one debate round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateRequest {
    pub persona: Persona,
    /// 1-based
    pub round: usize,
    pub prompt: String,
    /// Other personas' thinking output (absent if a persona failed)
    pub others_thinking: BTreeMap<Persona, String>,
    /// Other personas' responses from the previous round, keyed by author
    pub previous_round: BTreeMap<Persona, BTreeMap<Persona, String>>,
}

impl DebateRequest {
    /// Personas this request asks for responses to
    pub fn targets(&self) -> [Persona; 2] {
        self.persona.others()
    }
}

/// Append-only store of run artifacts
#[derive(Debug, Clone, Default)]
pub struct ContextManager {
    entries: Vec<ContextEntry>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run with `prompt` as the only entry.
    pub fn reset(&mut self, prompt: &str) {
        self.entries.clear();
        self.entries.push(ContextEntry {
            phase: Phase::Thinking,
            kind: EntryKind::Request,
            text: prompt.to_string(),
        });
    }

    pub fn record_thinking(&mut self, result: &ThinkingResult) {
        self.entries.push(ContextEntry {
            phase: Phase::Thinking,
            kind: EntryKind::Thinking {
                persona: result.persona,
            },
            text: result.text.clone(),
        });
    }

    pub fn record_debate(&mut self, result: &DebateResult) {
        for (target, text) in &result.responses {
            self.entries.push(ContextEntry {
                phase: Phase::Debate,
                kind: EntryKind::Debate {
                    persona: result.persona,
                    round: result.round,
                    target: *target,
                },
                text: text.clone(),
            });
        }
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn entries_for(&self, phase: Phase) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter().filter(move |e| e.phase == phase)
    }

    pub fn prompt(&self) -> &str {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Request)
            .map(|e| e.text.as_str())
            .unwrap_or_default()
    }

    /// Thinking input: the request and nothing else.
    pub fn thinking_view(&self) -> String {
        self.prompt().to_string()
    }

    /// Debate input for `persona` in `round`.
    pub fn debate_view(&self, persona: Persona, round: usize) -> DebateRequest {
        let mut others_thinking = BTreeMap::new();
        let mut previous_round: BTreeMap<Persona, BTreeMap<Persona, String>> = BTreeMap::new();

        for entry in &self.entries {
            match &entry.kind {
                EntryKind::Thinking { persona: author } if *author != persona => {
                    others_thinking.insert(*author, entry.text.clone());
                }
                EntryKind::Debate {
                    persona: author,
                    round: r,
                    target,
                } if *author != persona && *r + 1 == round => {
                    previous_round
                        .entry(*author)
                        .or_default()
                        .insert(*target, entry.text.clone());
                }
                _ => {}
            }
        }

        DebateRequest {
            persona,
            round,
            prompt: self.prompt().to_string(),
            others_thinking,
            previous_round,
        }
    }

    /// The full record rendered as a single document for voting.
    ///
    /// ```text
    /// ## Request
    ///
    /// <prompt>
    ///
    /// ## Thinking
    ///
    /// ### analyst
    /// <text>
    ///
    /// ## Debate Round 1
    ///
    /// ### analyst -> skeptic
    /// <text>
    /// ```
    pub fn voting_view(&self) -> String {
        let mut sections = vec![format!("## Request\n\n{}", self.prompt())];

        let thinking: Vec<String> = self
            .entries
            .iter()
            .filter_map(|e| match &e.kind {
                EntryKind::Thinking { persona } => Some(format!("### {}\n{}", persona, e.text)),
                _ => None,
            })
            .collect();
        if !thinking.is_empty() {
            sections.push(format!("## Thinking\n\n{}", thinking.join("\n\n")));
        }

        let mut rounds: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for entry in &self.entries {
            if let EntryKind::Debate {
                persona,
                round,
                target,
            } = &entry.kind
            {
                rounds
                    .entry(*round)
                    .or_default()
                    .push(format!("### {} -> {}\n{}", persona, target, entry.text));
            }
        }
        for (round, blocks) in rounds {
            sections.push(format!("## Debate Round {}\n\n{}", round, blocks.join("\n\n")));
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debate(persona: Persona, round: usize, text: &str) -> DebateResult {
        let responses = persona
            .others()
            .into_iter()
            .map(|t| (t, format!("{} to {}", text, t)))
            .collect();
        DebateResult::new(persona, round, responses)
    }

    fn populated() -> ContextManager {
        let mut ctx = ContextManager::new();
        ctx.reset("Should we ship?");
        for persona in Persona::ALL {
            ctx.record_thinking(&ThinkingResult::new(persona, format!("{} thinks", persona)));
        }
        ctx
    }

    #[test]
    fn test_thinking_view_is_request_only() {
        let ctx = populated();
        assert_eq!(ctx.thinking_view(), "Should we ship?");
        assert_eq!(ctx.entries_for(Phase::Thinking).count(), 4);
    }

    #[test]
    fn test_debate_view_excludes_own_output() {
        let mut ctx = populated();
        for persona in Persona::ALL {
            ctx.record_debate(&debate(persona, 1, "r1"));
        }

        let view = ctx.debate_view(Persona::Skeptic, 2);
        assert_eq!(view.prompt, "Should we ship?");
        assert_eq!(
            view.others_thinking.keys().copied().collect::<Vec<_>>(),
            vec![Persona::Analyst, Persona::Advocate]
        );
        assert!(!view.previous_round.contains_key(&Persona::Skeptic));
        assert_eq!(
            view.previous_round[&Persona::Analyst][&Persona::Skeptic],
            "r1 to skeptic"
        );
        assert_eq!(view.targets(), [Persona::Analyst, Persona::Advocate]);
    }

    #[test]
    fn test_first_round_has_no_previous_round() {
        let ctx = populated();
        assert!(ctx.debate_view(Persona::Analyst, 1).previous_round.is_empty());
    }

    #[test]
    fn test_voting_view_format() {
        let mut ctx = ContextManager::new();
        ctx.reset("Q");
        ctx.record_thinking(&ThinkingResult::new(Persona::Analyst, "A"));
        let mut responses = BTreeMap::new();
        responses.insert(Persona::Skeptic, "S".to_string());
        ctx.record_debate(&DebateResult::new(Persona::Analyst, 1, responses));

        assert_eq!(
            ctx.voting_view(),
            "## Request\n\nQ\n\n## Thinking\n\n### analyst\nA\n\n## Debate Round 1\n\n### analyst -> skeptic\nS"
        );
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let mut ctx = populated();
        ctx.reset("next");
        assert_eq!(ctx.entries().len(), 1);
        assert_eq!(ctx.voting_view(), "## Request\n\nnext");
    }
}
