//! Built-in prompt templates for the consensus flow
//!
//! Template bodies use `{placeholder}` substitution. A template provider
//! may override any body by name; the built-ins below are the fallback.

use crate::context::manager::DebateRequest;
use crate::core::persona::Persona;

/// Version reported for built-in template bodies
pub const BUILTIN_TEMPLATE_VERSION: &str = "builtin-1";

/// Template names, one per phase that calls an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    Think,
    Debate,
    Vote,
}

impl TemplateName {
    pub const ALL: [TemplateName; 3] = [TemplateName::Think, TemplateName::Debate, TemplateName::Vote];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateName::Think => "think",
            TemplateName::Debate => "debate",
            TemplateName::Vote => "vote",
        }
    }
}

impl std::fmt::Display for TemplateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt describing a persona's reasoning stance
    pub fn persona_system(persona: Persona) -> &'static str {
        match persona {
            Persona::Analyst => {
                r#"You are the Analyst on a three-member review council.
You reason from evidence: costs, data, feasibility and measurable impact.
State assumptions explicitly and quantify where you can.
Be concise and concrete."#
            }
            Persona::Skeptic => {
                r#"You are the Skeptic on a three-member review council.
You look for what can go wrong: risks, failure modes, hidden assumptions and missing safeguards.
Challenge claims that lack support, but acknowledge strong arguments.
Be concise and concrete."#
            }
            Persona::Advocate => {
                r#"You are the Advocate on a three-member review council.
You argue for the value a proposal delivers and the cost of saying no.
Look for ways to make the proposal work rather than reasons to reject it.
Be concise and concrete."#
            }
        }
    }

    /// Built-in body for `name`
    pub fn builtin(name: TemplateName) -> &'static str {
        match name {
            TemplateName::Think => {
                r#"Evaluate the following request on your own.

{prompt}

Give your independent assessment: the key considerations, your main concerns and your current leaning."#
            }
            TemplateName::Debate => {
                r#"Request under review:

{prompt}

This is debate round {round}. Here is what the other council members said:

{others}

Respond to each of them by name. Use exactly one section per member, each starting with a heading line:
{sections}

Agree where they are right, push back where they are wrong, and refine your own position."#
            }
            TemplateName::Vote => {
                r#"The council discussion so far:

{context}

Cast your vote. Reply with a single JSON object and nothing else:

{"vote": "APPROVE" | "DENY" | "CONDITIONAL", "reason": "<one or two sentences>", "confidence": <0.0-1.0>, "conditions": ["<only for CONDITIONAL>"]}"#
            }
        }
    }

    /// Replace each `{key}` in `body` with its value.
    pub fn render(body: &str, vars: &[(&str, &str)]) -> String {
        vars.iter().fold(body.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
    }

    pub fn think_prompt(body: &str, prompt: &str) -> String {
        Self::render(body, &[("prompt", prompt)])
    }

    pub fn debate_prompt(body: &str, request: &DebateRequest) -> String {
        let mut others = Vec::new();
        for (persona, text) in &request.others_thinking {
            others.push(format!("--- {} (thinking) ---\n{}", persona.display_name(), text));
        }
        for (persona, responses) in &request.previous_round {
            for (target, text) in responses {
                others.push(format!(
                    "--- {} to {} (round {}) ---\n{}",
                    persona.display_name(),
                    target.display_name(),
                    request.round.saturating_sub(1),
                    text
                ));
            }
        }
        if others.is_empty() {
            others.push("(no other positions are available)".to_string());
        }

        let sections = request
            .targets()
            .iter()
            .map(|t| format!("### To {}", t.display_name()))
            .collect::<Vec<_>>()
            .join("\n");
        let round = request.round.to_string();

        Self::render(
            body,
            &[
                ("prompt", request.prompt.as_str()),
                ("round", round.as_str()),
                ("others", others.join("\n\n").as_str()),
                ("sections", sections.as_str()),
            ],
        )
    }

    pub fn vote_prompt(body: &str, context: &str) -> String {
        Self::render(body, &[("context", context)])
    }
}
