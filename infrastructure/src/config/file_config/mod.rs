//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the application's
//! [`EngineConfig`] by [`FileConfig::to_engine_config`].

mod budget;
mod concurrency;
mod output;
mod provider;
mod quorum;
mod streaming;

pub use budget::FileBudgetConfig;
pub use concurrency::FileConcurrencyConfig;
pub use output::{FileAuditConfig, FileOutputConfig, FileOutputFormat, FileTemplatesConfig};
pub use provider::{FilePersonaConfig, FileProviderConfig};
pub use quorum::FileQuorumConfig;
pub use streaming::FileStreamingConfig;

use council_application::EngineConfig;
use council_domain::Persona;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("unknown threshold mode '{0}' (valid: majority, unanimous)")]
    InvalidThresholdMode(String),

    #[error("unknown overflow policy '{0}' (valid: drop, backpressure)")]
    InvalidOverflowPolicy(String),

    #[error("unknown language tag '{0}' in [budget]")]
    UnknownLanguage(String),

    #[error("unknown persona '{0}' in [personas] (valid: analyst, skeptic, advocate)")]
    UnknownPersona(String),

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("provider timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("{0}")]
    Engine(String),
}

/// Engine-wide settings (`[engine]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    pub debate_rounds: usize,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            debate_rounds: EngineConfig::default().debate_rounds,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub engine: FileEngineConfig,
    pub quorum: FileQuorumConfig,
    pub budget: FileBudgetConfig,
    pub streaming: FileStreamingConfig,
    pub concurrency: FileConcurrencyConfig,
    pub provider: FileProviderConfig,
    /// Per-persona overrides keyed by persona name
    pub personas: BTreeMap<String, FilePersonaConfig>,
    pub templates: FileTemplatesConfig,
    pub output: FileOutputConfig,
    pub audit: FileAuditConfig,
}

impl FileConfig {
    /// Convert to the application's engine configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigValidationError> {
        let config = EngineConfig {
            debate_rounds: self.engine.debate_rounds,
            quorum: self.quorum.to_settings()?,
            token_budget: self.budget.to_budget()?,
            streaming: self.streaming.to_settings()?,
            concurrency: self.concurrency.to_settings(),
        };
        config
            .validate()
            .map_err(|e| ConfigValidationError::Engine(e.to_string()))?;
        Ok(config)
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.provider.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        for (name, persona) in &self.personas {
            name.parse::<Persona>()
                .map_err(|_| ConfigValidationError::UnknownPersona(name.clone()))?;
            if let Some(model) = &persona.model
                && model.trim().is_empty()
            {
                return Err(ConfigValidationError::EmptyModelName);
            }
        }
        self.to_engine_config().map(|_| ())
    }

    /// Model answering for `persona`
    pub fn model_for(&self, persona: Persona) -> &str {
        self.personas
            .iter()
            .find(|(name, _)| name.parse::<Persona>().ok() == Some(persona))
            .and_then(|(_, p)| p.model.as_deref())
            .unwrap_or(&self.provider.model)
    }
}
