//! Quorum configuration from TOML (`[quorum]` section)
//!
//! Controls how votes turn into a decision and how hard the engine tries
//! to collect them.
//!
//! ```toml
//! [quorum]
//! threshold_mode = "majority"   # or "unanimous"
//! quorum_threshold = 2          # valid votes required, 1..=3
//! retry_count = 2               # outer retries beyond the first attempt
//! schema_retry_count = 2        # retries after a malformed vote payload
//! ```

use super::ConfigValidationError;
use council_application::QuorumSettings;
use council_domain::ThresholdMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQuorumConfig {
    /// "majority" or "unanimous"
    pub threshold_mode: String,
    pub quorum_threshold: usize,
    pub retry_count: usize,
    pub schema_retry_count: usize,
}

impl Default for FileQuorumConfig {
    fn default() -> Self {
        let settings = QuorumSettings::default();
        Self {
            threshold_mode: settings.threshold_mode.as_str().to_string(),
            quorum_threshold: settings.quorum_threshold,
            retry_count: settings.retry_count,
            schema_retry_count: settings.schema_retry_count,
        }
    }
}

impl FileQuorumConfig {
    pub fn parse_threshold_mode(&self) -> Result<ThresholdMode, ConfigValidationError> {
        self.threshold_mode
            .parse()
            .map_err(|_| ConfigValidationError::InvalidThresholdMode(self.threshold_mode.clone()))
    }

    pub fn to_settings(&self) -> Result<QuorumSettings, ConfigValidationError> {
        Ok(QuorumSettings {
            threshold_mode: self.parse_threshold_mode()?,
            quorum_threshold: self.quorum_threshold,
            retry_count: self.retry_count,
            schema_retry_count: self.schema_retry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_config_default() {
        let config = FileQuorumConfig::default();
        assert_eq!(config.threshold_mode, "majority");
        assert_eq!(config.quorum_threshold, 2);
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.schema_retry_count, 2);
    }

    #[test]
    fn test_quorum_config_deserialize() {
        let toml_str = r#"
[quorum]
threshold_mode = "unanimous"
quorum_threshold = 3
retry_count = 0
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let settings = config.quorum.to_settings().unwrap();
        assert_eq!(settings.threshold_mode, ThresholdMode::Unanimous);
        assert_eq!(settings.quorum_threshold, 3);
        assert_eq!(settings.retry_count, 0);
        assert_eq!(settings.schema_retry_count, 2);
    }

    #[test]
    fn test_unknown_threshold_mode() {
        let config = FileQuorumConfig {
            threshold_mode: "most".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.to_settings(),
            Err(ConfigValidationError::InvalidThresholdMode(mode)) if mode == "most"
        ));
    }
}
