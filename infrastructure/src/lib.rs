//! Infrastructure layer for persona-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod templates;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat,
};
pub use logging::JsonlAuditLogger;
pub use providers::{OpenAiCompatGateway, OpenAiCompatSettings};
pub use templates::FileTemplateProvider;
