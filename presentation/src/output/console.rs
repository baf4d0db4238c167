//! Console output formatter for consensus results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use council_domain::{ConsensusResult, Decision, Vote, VoteResult};

/// Formats consensus results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete consensus result
    pub fn format(result: &ConsensusResult) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("Persona Council Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Request:".cyan().bold(),
            result.prompt
        ));

        // Phase 1: Thinking
        output.push_str(&Self::section_header("Phase 1: Independent Thinking"));
        if result.thinking_results.is_empty() {
            output.push_str(&format!("\n{}\n", "(no persona produced a result)".dimmed()));
        }
        for thinking in &result.thinking_results {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", thinking.persona.display_name())
                    .yellow()
                    .bold(),
                thinking.text
            ));
        }

        // Phase 2: Debate
        output.push_str(&Self::section_header("Phase 2: Debate"));
        for round in &result.debate_rounds {
            let title = if round.aborted {
                format!("Round {} (aborted: token budget exceeded)", round.round)
                    .red()
                    .bold()
            } else {
                format!("Round {}", round.round).bold()
            };
            output.push_str(&format!("\n{}\n", title));

            for debate in round.results.values() {
                for (target, text) in &debate.responses {
                    output.push_str(&format!(
                        "\n{}\n{}\n",
                        format!(
                            "── {} → {} ──",
                            debate.persona.display_name(),
                            target.display_name()
                        )
                        .yellow(),
                        Self::indent(text, "  ")
                    ));
                }
            }
        }

        // Phase 3: Voting
        output.push_str(&Self::section_header("Phase 3: Voting"));
        if result.fail_safe {
            output.push_str(&format!(
                "\n{}\n",
                "Quorum not met: no votes are reported.".red()
            ));
        }
        for vote in result.voting_results.values() {
            output.push_str(&Self::vote_line(vote));
        }

        output.push('\n');
        output.push_str(&Self::decision_block(result));

        if !result.reductions.is_empty() {
            output.push_str(&format!("\n{}\n", "Context reductions:".dimmed()));
            for log in &result.reductions {
                output.push_str(&format!(
                    "  {} {}: {} → {} tokens\n",
                    log.phase, log.reason, log.tokens_before, log.tokens_after
                ));
            }
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &ConsensusResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the decision only (concise output)
    pub fn format_decision_only(result: &ConsensusResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Persona Council Decision ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.prompt));
        output.push_str(&Self::decision_block(result));

        output
    }

    fn decision_block(result: &ConsensusResult) -> String {
        let mut output = format!(
            "{} {}",
            "Decision:".bold(),
            Self::decision_label(result.decision)
        );
        if let Some(tally) = &result.tally {
            output.push_str(&format!(
                "  {} ({} approve, {} conditional, {} deny)",
                tally.summary().dimmed(),
                tally.approve_count,
                tally.conditional_count,
                tally.deny_count
            ));
        }
        output.push('\n');

        if result.fail_safe {
            output.push_str(&format!(
                "{}\n",
                "Fail-safe: too few valid votes, denied by default.".red()
            ));
        }

        if !result.excluded.is_empty() {
            let names: Vec<&str> = result.excluded.iter().map(|p| p.display_name()).collect();
            output.push_str(&format!(
                "{} {}\n",
                "Excluded:".yellow(),
                names.join(", ")
            ));
        }

        if !result.conditions.is_empty() {
            output.push_str(&format!("\n{}\n", "Conditions:".yellow().bold()));
            for condition in &result.conditions {
                output.push_str(&format!("  * {}\n", condition));
            }
        }

        output
    }

    fn vote_line(vote: &VoteResult) -> String {
        let label = match vote.vote {
            Vote::Approve => vote.vote.as_str().green().bold(),
            Vote::Deny => vote.vote.as_str().red().bold(),
            Vote::Conditional => vote.vote.as_str().yellow().bold(),
        };
        let confidence = vote
            .confidence
            .map(|c| format!(" ({:.0}%)", c * 100.0))
            .unwrap_or_default();
        format!(
            "\n  {:<10} {}{}\n{}\n",
            vote.persona.display_name(),
            label,
            confidence.dimmed(),
            Self::indent(&vote.reason, "    ")
        )
    }

    fn decision_label(decision: Decision) -> ColoredString {
        let label = decision.as_str().to_uppercase();
        match decision {
            Decision::Approved => label.green().bold(),
            Decision::Denied => label.red().bold(),
            Decision::Conditional => label.yellow().bold(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &ConsensusResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &ConsensusResult) -> String {
        Self::format_json(result)
    }

    fn format_decision_only(&self, result: &ConsensusResult) -> String {
        Self::format_decision_only(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{DebateResult, DebateRound, OutputFormat, Persona, ThinkingResult};
    use std::collections::BTreeMap;

    fn decided() -> ConsensusResult {
        let mut votes = BTreeMap::new();
        votes.insert(Persona::Analyst, VoteResult::approve(Persona::Analyst, "numbers work"));
        votes.insert(
            Persona::Skeptic,
            VoteResult::conditional(Persona::Skeptic, "risky", vec!["add monitoring".into()]),
        );
        votes.insert(Persona::Advocate, VoteResult::approve(Persona::Advocate, "ship it"));

        let mut round = DebateRound::new(1);
        let mut responses = BTreeMap::new();
        responses.insert(Persona::Skeptic, "what about rollback?".to_string());
        round.insert(DebateResult::new(Persona::Analyst, 1, responses));

        ConsensusResult::decided(
            "ship X?",
            vec![ThinkingResult::new(Persona::Analyst, "looks fine")],
            vec![round],
            votes,
            Decision::Approved,
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_full_format_contains_every_phase() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format(&decided());
        assert!(output.contains("Request: ship X?"));
        assert!(output.contains("looks fine"));
        assert!(output.contains("Round 1"));
        assert!(output.contains("what about rollback?"));
        assert!(output.contains("CONDITIONAL"));
        assert!(output.contains("Decision: APPROVED"));
        assert!(output.contains("* add monitoring"));
    }

    #[test]
    fn test_decision_only_format() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format_decision_only(&decided());
        assert!(output.contains("Decision: APPROVED"));
        assert!(output.contains("[++?]"));
        assert!(!output.contains("looks fine"));
    }

    #[test]
    fn test_fail_safe_format() {
        colored::control::set_override(false);
        let result = ConsensusResult::fail_safe(
            "ship X?",
            vec![],
            vec![],
            vec![Persona::Advocate, Persona::Skeptic],
            true,
            vec![],
        );
        let output = ConsoleFormatter::format_decision_only(&result);
        assert!(output.contains("Decision: DENIED"));
        assert!(output.contains("Fail-safe"));
        assert!(output.contains("Excluded: Advocate, Skeptic"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let json = ConsoleFormatter.render(&decided(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["decision"], "approved");
        assert_eq!(value["exit_code"], 0);
        assert_eq!(value["conditions"][0], "add monitoring");
    }
}
