//! Prompt template sources
//!
//! Provides [`FileTemplateProvider`], which implements the
//! [`TemplateProvider`](council_application::TemplateProvider) port from a
//! directory of markdown files.

mod file_provider;

pub use file_provider::FileTemplateProvider;
