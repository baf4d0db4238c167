//! Token budget configuration from TOML (`[budget]` section)
//!
//! ```toml
//! [budget]
//! max_tokens = 8000
//! tokens_per_char = 0.5
//! language = "ja"          # optional: script-specific rate
//! rate_override = 0.6      # optional: wins over both
//! ```

use super::ConfigValidationError;
use council_domain::TokenBudget;
use council_domain::context::language_rate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBudgetConfig {
    pub max_tokens: usize,
    pub tokens_per_char: f64,
    /// Language tag (e.g. `ja`, `en-US`) selecting a per-script rate
    pub language: Option<String>,
    pub rate_override: Option<f64>,
}

impl Default for FileBudgetConfig {
    fn default() -> Self {
        let budget = TokenBudget::default();
        Self {
            max_tokens: budget.max_tokens,
            tokens_per_char: budget.tokens_per_char,
            language: None,
            rate_override: None,
        }
    }
}

impl FileBudgetConfig {
    pub fn to_budget(&self) -> Result<TokenBudget, ConfigValidationError> {
        let language_override = match &self.language {
            Some(tag) => Some(
                language_rate(tag)
                    .ok_or_else(|| ConfigValidationError::UnknownLanguage(tag.clone()))?,
            ),
            None => None,
        };

        Ok(TokenBudget::new(self.max_tokens)
            .with_tokens_per_char(self.tokens_per_char)
            .with_rate_override(self.rate_override.or(language_override)))
    }
}
