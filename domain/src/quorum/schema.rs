//! Structural validation of vote payloads.
//!
//! A vote payload is the JSON object a persona returns from the Voting
//! phase:
//!
//! ```json
//! {"vote": "CONDITIONAL", "reason": "...", "confidence": 0.7, "conditions": ["..."]}
//! ```
//!
//! | Key | Rule |
//! |-----|------|
//! | `vote` | required, one of `APPROVE`, `DENY`, `CONDITIONAL` |
//! | `reason` | required, non-empty string |
//! | `confidence` | optional, number in `[0, 1]` |
//! | `conditions` | optional list of strings, only with `CONDITIONAL` |

use super::vote::{Vote, VoteResult};
use crate::core::persona::Persona;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of validating one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub ok: bool,
    /// Human-readable violations, empty when `ok`
    pub errors: Vec<String>,
}

impl SchemaValidation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// Validate the structure of a vote payload.
///
/// # Example
///
/// ```
/// use council_domain::quorum::schema::validate_vote_payload;
///
/// let ok = validate_vote_payload(&serde_json::json!({"vote": "APPROVE", "reason": "sound"}));
/// assert!(ok.ok);
///
/// let bad = validate_vote_payload(&serde_json::json!({"vote": "MAYBE"}));
/// assert_eq!(bad.errors.len(), 2);
/// ```
pub fn validate_vote_payload(payload: &Value) -> SchemaValidation {
    let Some(object) = payload.as_object() else {
        return SchemaValidation::from_errors(vec!["payload must be a JSON object".to_string()]);
    };

    let mut errors = Vec::new();

    let vote = match object.get("vote") {
        None | Some(Value::Null) => {
            errors.push("missing required field `vote`".to_string());
            None
        }
        Some(Value::String(s)) => match s.parse::<Vote>() {
            Ok(vote) => Some(vote),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        Some(_) => {
            errors.push("`vote` must be a string".to_string());
            None
        }
    };

    match object.get("reason") {
        None | Some(Value::Null) => errors.push("missing required field `reason`".to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push("`reason` must be a non-empty string".to_string())
        }
        Some(Value::String(_)) => {}
        Some(_) => errors.push("`reason` must be a string".to_string()),
    }

    match object.get("confidence") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) => match n.as_f64() {
            Some(c) if (0.0..=1.0).contains(&c) => {}
            _ => errors.push(format!("`confidence` must be within [0, 1] (got {})", n)),
        },
        Some(_) => errors.push("`confidence` must be a number".to_string()),
    }

    match object.get("conditions") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            if items.iter().any(|item| !item.is_string()) {
                errors.push("`conditions` must be a list of strings".to_string());
            }
            if vote.is_some_and(|v| v != Vote::Conditional) {
                errors.push("`conditions` is only allowed when vote is CONDITIONAL".to_string());
            }
        }
        Some(_) => errors.push("`conditions` must be a list of strings".to_string()),
    }

    SchemaValidation::from_errors(errors)
}

/// Validate `payload` and convert it into a [`VoteResult`] for `persona`.
///
/// Returns the validator's error list on failure.
pub fn parse_vote_payload(persona: Persona, payload: &Value) -> Result<VoteResult, Vec<String>> {
    let validation = validate_vote_payload(payload);
    if !validation.ok {
        return Err(validation.errors);
    }

    let str_field = |key: &str| payload.get(key).and_then(Value::as_str).unwrap_or_default();
    let vote: Vote = str_field("vote").parse().map_err(|e: String| vec![e])?;
    let reason = str_field("reason").trim().to_string();

    let mut result = match vote {
        Vote::Approve => VoteResult::approve(persona, reason),
        Vote::Deny => VoteResult::deny(persona, reason),
        Vote::Conditional => {
            let conditions = payload
                .get("conditions")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            VoteResult::conditional(persona, reason, conditions)
        }
    };

    if let Some(confidence) = payload.get("confidence").and_then(Value::as_f64) {
        result = result.with_confidence(confidence);
    }

    Ok(result)
}

/// Find the vote payload object inside free-form model output.
///
/// Accepts a bare object or one wrapped in prose / a fenced code block:
/// the outermost `{ ... }` span is parsed.
pub fn extract_vote_payload(response: &str) -> Option<Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payloads() {
        assert!(validate_vote_payload(&json!({"vote": "APPROVE", "reason": "fine"})).ok);
        assert!(validate_vote_payload(&json!({"vote": "DENY", "reason": "risky", "confidence": 0.0})).ok);
        assert!(
            validate_vote_payload(&json!({
                "vote": "CONDITIONAL",
                "reason": "needs work",
                "confidence": 1,
                "conditions": ["add tests"]
            }))
            .ok
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let result = validate_vote_payload(&json!({}));
        assert!(!result.ok);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("vote"));
        assert!(result.errors[1].contains("reason"));
    }

    #[test]
    fn test_enum_and_range_violations() {
        let result = validate_vote_payload(&json!({
            "vote": "approve",
            "reason": "   ",
            "confidence": 1.5
        }));
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_conditions_only_with_conditional() {
        let result = validate_vote_payload(&json!({
            "vote": "APPROVE",
            "reason": "ok",
            "conditions": ["x"]
        }));
        assert!(!result.ok);
        assert!(result.errors[0].contains("only allowed"));

        let result = validate_vote_payload(&json!({
            "vote": "CONDITIONAL",
            "reason": "ok",
            "conditions": ["x", 3]
        }));
        assert!(!result.ok);
    }

    #[test]
    fn test_non_object_payload() {
        let result = validate_vote_payload(&json!(["APPROVE"]));
        assert!(!result.ok);
        assert_eq!(result.errors, vec!["payload must be a JSON object".to_string()]);
    }

    #[test]
    fn test_parse_conditional_payload() {
        let vote = parse_vote_payload(
            Persona::Skeptic,
            &json!({"vote": "CONDITIONAL", "reason": "ok", "conditions": ["add monitoring"], "confidence": 0.6}),
        )
        .unwrap();
        assert_eq!(vote.vote, Vote::Conditional);
        assert_eq!(vote.condition_list(), ["add monitoring".to_string()]);
        assert_eq!(vote.confidence, Some(0.6));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let errors = parse_vote_payload(Persona::Analyst, &json!({"vote": "YES"})).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "My vote:\n```json\n{\"vote\": \"DENY\", \"reason\": \"too risky\"}\n```";
        let payload = extract_vote_payload(text).unwrap();
        assert_eq!(payload["vote"], "DENY");
        assert!(extract_vote_payload("no json here").is_none());
    }
}
