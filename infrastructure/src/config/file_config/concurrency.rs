//! Concurrency configuration from TOML (`[concurrency]` section)

use council_application::ConcurrencySettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ```toml
/// [concurrency]
/// max_concurrent = 3
/// acquire_timeout_seconds = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConcurrencyConfig {
    pub max_concurrent: usize,
    pub acquire_timeout_seconds: u64,
}

impl Default for FileConcurrencyConfig {
    fn default() -> Self {
        let settings = ConcurrencySettings::default();
        Self {
            max_concurrent: settings.max_concurrent,
            acquire_timeout_seconds: settings.acquire_timeout.as_secs(),
        }
    }
}

impl FileConcurrencyConfig {
    pub fn to_settings(&self) -> ConcurrencySettings {
        ConcurrencySettings {
            max_concurrent: self.max_concurrent,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_seconds),
        }
    }
}
