//! Parsing of free-form debate responses

use crate::core::persona::Persona;
use std::collections::BTreeMap;

/// Split a debate response into one text per target persona.
///
/// Sections start with a markdown heading naming the target
/// (`### To Skeptic`, `## skeptic:`). A target without its own section
/// receives the whole response.
pub fn parse_debate_sections(response: &str, targets: &[Persona]) -> BTreeMap<Persona, String> {
    let mut sections: BTreeMap<Persona, Vec<&str>> = BTreeMap::new();
    let mut current: Option<Persona> = None;

    for line in response.lines() {
        if is_heading(line) {
            current = section_target(line).filter(|p| targets.contains(p));
            if let Some(p) = current {
                sections.entry(p).or_default();
            }
            continue;
        }
        if let Some(p) = current {
            sections.entry(p).or_default().push(line);
        }
    }

    targets
        .iter()
        .map(|target| {
            let text = sections
                .get(target)
                .map(|lines| lines.join("\n").trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| response.trim().to_string());
            (*target, text)
        })
        .collect()
}

fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn section_target(line: &str) -> Option<Persona> {
    let title = line.trim_start().trim_start_matches('#').trim();
    let title = title
        .strip_prefix("To ")
        .or_else(|| title.strip_prefix("to "))
        .unwrap_or(title);
    title
        .trim_end_matches(':')
        .trim()
        .trim_start_matches("the ")
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let response = "Intro line\n### To Analyst\nYour numbers ignore churn.\n\n### To Advocate\nValue is real.\nBut risky.";
        let sections =
            parse_debate_sections(response, &[Persona::Analyst, Persona::Advocate]);
        assert_eq!(sections[&Persona::Analyst], "Your numbers ignore churn.");
        assert_eq!(sections[&Persona::Advocate], "Value is real.\nBut risky.");
    }

    #[test]
    fn test_missing_section_gets_whole_response() {
        let response = "## skeptic:\nfair point";
        let sections = parse_debate_sections(response, &[Persona::Skeptic, Persona::Advocate]);
        assert_eq!(sections[&Persona::Skeptic], "fair point");
        assert_eq!(sections[&Persona::Advocate], response);
    }

    #[test]
    fn test_unrelated_headings_are_ignored() {
        let response = "### To Analyst\nagree\n### Summary\nstill agree";
        let sections = parse_debate_sections(response, &[Persona::Analyst, Persona::Skeptic]);
        assert_eq!(sections[&Persona::Analyst], "agree");
    }
}
