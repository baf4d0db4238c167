//! Token budget enforcement and context compression.
//!
//! [`TokenBudgetManager`] keeps text handed to a reasoning call under a
//! configured ceiling of *estimated* tokens.
//!
//! # Estimation
//!
//! `ceil(chars × rate)`. The rate defaults to 0.5 tokens per character.
//! A language tag selects a script-specific rate (~0.72 for logographic
//! scripts, ~0.45 for Latin scripts), and an explicitly configured rate
//! overrides both.
//!
//! # Compression
//!
//! Over-budget text is split into blank-line separated segments. Segments
//! are scored (headings > priority markers > plain text, short segments
//! get a bonus), greedily selected by score while they fit, and then
//! reassembled in their original order. If nothing fits, or the selection
//! is still too large, the text is hard-truncated to
//! `floor(max_tokens / rate)` characters.

use crate::core::string::take_chars;
use crate::orchestration::phase::Phase;
use serde::{Deserialize, Serialize};

/// Default tokens-per-character rate
pub const DEFAULT_TOKENS_PER_CHAR: f64 = 0.5;
/// Rate used for logographic scripts (CJK)
pub const LOGOGRAPHIC_TOKENS_PER_CHAR: f64 = 0.72;
/// Rate used for Latin scripts
pub const LATIN_TOKENS_PER_CHAR: f64 = 0.45;

/// Segments shorter than this many characters get a bonus point
const SHORT_SEGMENT_CHARS: usize = 120;

/// Keywords that mark a segment as dialogue-relevant
const PRIORITY_MARKERS: &[&str] = &[
    "§",
    "[thinking]",
    "[debate]",
    "[voting]",
    "rebuttal",
    "counterpoint",
    "thinking",
    "debate",
    "voting",
];

const LOGOGRAPHIC_LANGUAGES: &[&str] = &["ja", "zh", "ko", "yue"];
const LATIN_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "nl", "sv", "da", "no", "fi", "pl", "cs", "ro", "tr", "id",
    "vi",
];

/// Resolve a BCP-47-ish language tag (e.g. `ja-JP`, `en`) to a rate.
pub fn language_rate(language: &str) -> Option<f64> {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if LOGOGRAPHIC_LANGUAGES.contains(&primary.as_str()) {
        Some(LOGOGRAPHIC_TOKENS_PER_CHAR)
    } else if LATIN_LANGUAGES.contains(&primary.as_str()) {
        Some(LATIN_TOKENS_PER_CHAR)
    } else {
        None
    }
}

/// Why a text was reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionReason {
    /// Segment selection alone brought the text under budget
    ExceededSummary,
    /// Hard truncation was needed
    ExceededTrimmed,
}

impl ReductionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionReason::ExceededSummary => "exceeded_summary",
            ReductionReason::ExceededTrimmed => "exceeded_trimmed",
        }
    }
}

impl std::fmt::Display for ReductionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only audit record of one compression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionLog {
    pub phase: Phase,
    pub reason: ReductionReason,
    pub tokens_before: usize,
    pub tokens_after: usize,
}

/// Result of [`TokenBudgetManager::enforce`]
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOutcome {
    pub text: String,
    pub summary_applied: bool,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub reason: Option<ReductionReason>,
    pub phase: Phase,
}

impl BudgetOutcome {
    /// Audit record, present only when the text was reduced
    pub fn reduction_log(&self) -> Option<ReductionLog> {
        self.reason.map(|reason| ReductionLog {
            phase: self.phase,
            reason,
            tokens_before: self.tokens_before,
            tokens_after: self.tokens_after,
        })
    }
}

/// Budget settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub max_tokens: usize,
    pub tokens_per_char: f64,
    /// Explicit rate that overrides both the default and language rates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_override: Option<f64>,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 8_000,
            tokens_per_char: DEFAULT_TOKENS_PER_CHAR,
            rate_override: None,
        }
    }
}

impl TokenBudget {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            ..Default::default()
        }
    }

    pub fn with_tokens_per_char(mut self, rate: f64) -> Self {
        self.tokens_per_char = rate;
        self
    }

    pub fn with_rate_override(mut self, rate: Option<f64>) -> Self {
        self.rate_override = rate;
        self
    }

    /// Validate this budget, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !(self.tokens_per_char > 0.0) {
            issues.push(format!(
                "token_budget: tokens_per_char ({}) must be > 0",
                self.tokens_per_char
            ));
        }
        if let Some(rate) = self.rate_override
            && !(rate > 0.0)
        {
            issues.push(format!("token_budget: rate_override ({}) must be > 0", rate));
        }
        issues
    }
}

/// Estimates, enforces and compresses against a [`TokenBudget`].
///
/// # Example
///
/// ```
/// use council_domain::{Phase, TokenBudget, TokenBudgetManager};
///
/// let manager = TokenBudgetManager::new(TokenBudget::new(10));
/// assert_eq!(manager.estimate_tokens("abcd", None), 2);
///
/// let outcome = manager.enforce("short", Phase::Voting);
/// assert!(!outcome.summary_applied);
/// ```
#[derive(Debug, Clone)]
pub struct TokenBudgetManager {
    budget: TokenBudget,
}

impl TokenBudgetManager {
    pub fn new(budget: TokenBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn max_tokens(&self) -> usize {
        self.budget.max_tokens
    }

    /// Rate used when no language tag is given
    fn base_rate(&self) -> f64 {
        self.budget.rate_override.unwrap_or(self.budget.tokens_per_char)
    }

    fn rate_for(&self, language: Option<&str>) -> f64 {
        if let Some(rate) = self.budget.rate_override {
            return rate;
        }
        language
            .and_then(language_rate)
            .unwrap_or(self.budget.tokens_per_char)
    }

    /// Estimate the token cost of `text`, rounded up.
    pub fn estimate_tokens(&self, text: &str, language: Option<&str>) -> usize {
        estimate_with_rate(text.chars().count(), self.rate_for(language))
    }

    /// Estimate for a known character count at the base rate.
    pub fn estimate_char_count(&self, chars: usize) -> usize {
        estimate_with_rate(chars, self.base_rate())
    }

    fn estimate(&self, text: &str) -> usize {
        estimate_with_rate(text.chars().count(), self.base_rate())
    }

    /// Keep `text` within budget, compressing it when necessary.
    pub fn enforce(&self, text: &str, phase: Phase) -> BudgetOutcome {
        let max = self.budget.max_tokens;
        let tokens_before = self.estimate(text);

        if tokens_before <= max {
            return BudgetOutcome {
                text: text.to_string(),
                summary_applied: false,
                tokens_before,
                tokens_after: tokens_before,
                reason: None,
                phase,
            };
        }

        let segments = split_segments(text);
        let selected = self.select_segments(&segments);

        let (compressed, reason) = if selected.is_empty() {
            let first = segments.first().map(String::as_str).unwrap_or(text);
            (self.hard_truncate(first), ReductionReason::ExceededTrimmed)
        } else {
            let joined = selected
                .iter()
                .map(|&i| segments[i].as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            if self.estimate(&joined) > max {
                (self.hard_truncate(&joined), ReductionReason::ExceededTrimmed)
            } else {
                (joined, ReductionReason::ExceededSummary)
            }
        };

        let tokens_after = self.estimate(&compressed);
        BudgetOutcome {
            text: compressed,
            summary_applied: true,
            tokens_before,
            tokens_after,
            reason: Some(reason),
            phase,
        }
    }

    /// Indices of the segments kept, in original order.
    fn select_segments(&self, segments: &[String]) -> Vec<usize> {
        let mut ranked: Vec<(usize, u32)> = segments
            .iter()
            .enumerate()
            .map(|(i, s)| (i, score_segment(s)))
            .collect();
        // Stable sort keeps original position as the tie breaker
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut running = 0usize;
        let mut selected = Vec::new();
        for (index, _) in ranked {
            let cost = self.estimate(&segments[index]);
            if running + cost <= self.budget.max_tokens {
                running += cost;
                selected.push(index);
            }
        }
        selected.sort_unstable();
        selected
    }

    /// Cut `text` to `floor(max_tokens / rate)` characters.
    fn hard_truncate(&self, text: &str) -> String {
        let rate = self.base_rate();
        let mut max_chars = (self.budget.max_tokens as f64 / rate).floor() as usize;
        while max_chars > 0 && estimate_with_rate(max_chars, rate) > self.budget.max_tokens {
            max_chars -= 1;
        }
        take_chars(text, max_chars)
    }
}

fn estimate_with_rate(chars: usize, rate: f64) -> usize {
    // Small epsilon so that e.g. 100 chars × 0.1 does not round up to 11
    let raw = chars as f64 * rate - 1e-9;
    if raw <= 0.0 { 0 } else { raw.ceil() as usize }
}

/// Split on blank lines, dropping empty segments.
fn split_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                segments.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        segments.push(current.join("\n"));
    }
    segments
}

fn is_heading(segment: &str) -> bool {
    segment.lines().any(|line| {
        let trimmed = line.trim_start();
        let hashes = trimmed.chars().take_while(|&c| c == '#').count();
        (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ')
    })
}

fn has_priority_marker(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    PRIORITY_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn score_segment(segment: &str) -> u32 {
    let mut score = 1;
    if is_heading(segment) {
        score += 3;
    } else if has_priority_marker(segment) {
        score += 2;
    }
    if segment.chars().count() < SHORT_SEGMENT_CHARS {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(max_tokens: usize) -> TokenBudgetManager {
        TokenBudgetManager::new(TokenBudget::new(max_tokens))
    }

    #[test]
    fn test_estimate_rounds_up() {
        let m = manager(100);
        assert_eq!(m.estimate_tokens("", None), 0);
        assert_eq!(m.estimate_tokens("a", None), 1);
        assert_eq!(m.estimate_tokens("abcd", None), 2);
        assert_eq!(m.estimate_tokens("abcde", None), 3);
    }

    #[test]
    fn test_estimate_language_rates() {
        let m = manager(100);
        let text = "x".repeat(100);
        assert_eq!(m.estimate_tokens(&text, Some("ja-JP")), 72);
        assert_eq!(m.estimate_tokens(&text, Some("en")), 45);
        assert_eq!(m.estimate_tokens(&text, Some("xx")), 50);

        let overridden = TokenBudgetManager::new(TokenBudget::new(100).with_rate_override(Some(0.1)));
        assert_eq!(overridden.estimate_tokens(&text, Some("ja")), 10);
    }

    #[test]
    fn test_within_budget_is_unchanged() {
        let m = manager(50);
        let text = "## Heading\n\nsome body text";
        let outcome = m.enforce(text, Phase::Voting);
        assert!(!outcome.summary_applied);
        assert_eq!(outcome.text, text);
        assert!(outcome.reduction_log().is_none());
    }

    #[test]
    fn test_compression_keeps_headings_in_original_order() {
        let body = "plain filler sentence that carries little weight. ".repeat(6);
        let text = format!("{}\n\n## Decision\n\n{}\n\nshort note", body, body);
        let m = manager(30);
        let outcome = m.enforce(&text, Phase::Voting);

        assert!(outcome.summary_applied);
        assert_eq!(outcome.reason, Some(ReductionReason::ExceededSummary));
        assert_eq!(outcome.text, "## Decision\n\nshort note");
        assert!(outcome.tokens_after <= 30);
        assert!(outcome.tokens_before > 30);
    }

    #[test]
    fn test_priority_marker_beats_plain_text() {
        let plain = "p".repeat(130);
        let marked = format!("rebuttal {}", "r".repeat(121));
        let text = format!("{}\n\n{}", plain, marked);
        // Each segment costs 65-66 tokens; only one fits
        let outcome = manager(70).enforce(&text, Phase::Debate);
        assert_eq!(outcome.text, marked);
    }

    #[test]
    fn test_no_segment_fits_truncates_first_segment() {
        let text = format!("{}\n\n{}", "a".repeat(200), "b".repeat(200));
        let outcome = manager(10).enforce(&text, Phase::Voting);
        assert_eq!(outcome.reason, Some(ReductionReason::ExceededTrimmed));
        assert_eq!(outcome.text, "a".repeat(20));
        assert_eq!(outcome.tokens_after, 10);
    }

    #[test]
    fn test_single_unsplittable_text_is_truncated() {
        let text = "word ".repeat(100);
        let outcome = manager(5).enforce(&text, Phase::Voting);
        assert_eq!(outcome.text.chars().count(), 10);
        assert!(outcome.tokens_after <= 5);
    }

    #[test]
    fn test_enforce_is_monotone() {
        let text = (0..40)
            .map(|i| format!("### point {}\nreasoning line number {} with detail", i, i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let m = manager(120);
        let first = m.enforce(&text, Phase::Voting);
        let second = m.enforce(&first.text, Phase::Voting);
        assert!(first.summary_applied);
        assert!(second.tokens_after <= first.tokens_after);
        assert!(!second.summary_applied);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_fractional_rate_truncation_stays_within_budget() {
        let m = TokenBudgetManager::new(TokenBudget::new(10).with_tokens_per_char(0.1));
        let outcome = m.enforce(&"z".repeat(500), Phase::Voting);
        assert!(outcome.tokens_after <= 10);
        assert_eq!(outcome.text.chars().count(), 100);
    }

    #[test]
    fn test_reduction_log() {
        let outcome = manager(1).enforce("abcdef", Phase::Voting);
        let log = outcome.reduction_log().unwrap();
        assert_eq!(log.phase, Phase::Voting);
        assert_eq!(log.tokens_before, 3);
        assert_eq!(log.tokens_after, 1);
        assert_eq!(
            serde_json::to_value(log.reason).unwrap(),
            serde_json::json!("exceeded_trimmed")
        );
    }

    #[test]
    fn test_validate() {
        assert!(TokenBudget::default().validate().is_empty());
        assert_eq!(TokenBudget::new(10).with_tokens_per_char(0.0).validate().len(), 1);
    }
}
