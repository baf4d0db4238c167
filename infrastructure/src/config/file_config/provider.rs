//! Provider and persona configuration from TOML
//! (`[provider]` and `[personas.<name>]` sections)
//!
//! ```toml
//! [provider]
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! model = "gpt-4o-mini"
//! timeout_seconds = 120
//!
//! [personas.skeptic]
//! model = "gpt-4o"
//! ```

use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Environment variable holding the API key (unset means no auth header)
    pub api_key_env: String,
    /// Model used by every persona without its own override
    pub model: String,
    /// HTTP timeout per request
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 120,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Per-persona overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersonaConfig {
    pub model: Option<String>,
}
