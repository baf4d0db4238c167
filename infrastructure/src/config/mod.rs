//! Configuration file loading for persona-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNCIL_*` environment variables (`COUNCIL_QUORUM__RETRY_COUNT=3`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global: `$XDG_CONFIG_HOME/persona-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAuditConfig, FileBudgetConfig, FileConcurrencyConfig, FileConfig,
    FileEngineConfig, FileOutputConfig, FileOutputFormat, FilePersonaConfig, FileProviderConfig,
    FileQuorumConfig, FileStreamingConfig, FileTemplatesConfig,
};
pub use loader::ConfigLoader;
