//! Streaming configuration from TOML (`[streaming]` section)
//!
//! ```toml
//! [streaming]
//! enabled = true
//! capacity = 64
//! overflow_policy = "drop"     # or "backpressure"
//! emit_timeout_ms = 2000
//! send_timeout_ms = 5000
//! max_debate_tokens = 4000     # defaults to [budget] max_tokens
//! ```

use super::ConfigValidationError;
use council_application::StreamingSettings;
use council_domain::OverflowPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamingConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub overflow_policy: String,
    pub emit_timeout_ms: u64,
    pub send_timeout_ms: u64,
    pub max_debate_tokens: Option<usize>,
}

impl Default for FileStreamingConfig {
    fn default() -> Self {
        let settings = StreamingSettings::default();
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity,
            overflow_policy: settings.overflow_policy.as_str().to_string(),
            emit_timeout_ms: settings.emit_timeout.as_millis() as u64,
            send_timeout_ms: settings.send_timeout.as_millis() as u64,
            max_debate_tokens: settings.max_debate_tokens,
        }
    }
}

impl FileStreamingConfig {
    pub fn parse_overflow_policy(&self) -> Result<OverflowPolicy, ConfigValidationError> {
        self.overflow_policy
            .parse()
            .map_err(|_| ConfigValidationError::InvalidOverflowPolicy(self.overflow_policy.clone()))
    }

    pub fn to_settings(&self) -> Result<StreamingSettings, ConfigValidationError> {
        Ok(StreamingSettings {
            enabled: self.enabled,
            capacity: self.capacity,
            overflow_policy: self.parse_overflow_policy()?,
            emit_timeout: Duration::from_millis(self.emit_timeout_ms),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            max_debate_tokens: self.max_debate_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_defaults_round_trip_to_settings() {
        let settings = FileStreamingConfig::default().to_settings().unwrap();
        assert_eq!(settings, StreamingSettings::default());
    }

    #[test]
    fn test_streaming_deserialize() {
        let toml_str = r#"
[streaming]
enabled = true
overflow_policy = "backpressure"
emit_timeout_ms = 250
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let settings = config.streaming.to_settings().unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.overflow_policy, OverflowPolicy::Backpressure);
        assert_eq!(settings.emit_timeout, Duration::from_millis(250));
        assert_eq!(settings.capacity, 64);
    }

    #[test]
    fn test_unknown_overflow_policy() {
        let config = FileStreamingConfig {
            overflow_policy: "block".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.to_settings(),
            Err(ConfigValidationError::InvalidOverflowPolicy(_))
        ));
    }
}
