//! Template provider port
//!
//! Supplies `(version, body)` pairs per template name. The version is
//! recorded alongside schema retries so a rejected payload can be traced
//! back to the exact prompt that produced it.

use council_domain::{BUILTIN_TEMPLATE_VERSION, PromptTemplate, TemplateName};

/// A template body with its cache version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTemplate {
    pub name: String,
    pub version: String,
    pub body: String,
}

impl CachedTemplate {
    pub fn builtin(name: TemplateName) -> Self {
        Self {
            name: name.as_str().to_string(),
            version: BUILTIN_TEMPLATE_VERSION.to_string(),
            body: PromptTemplate::builtin(name).to_string(),
        }
    }
}

/// Source of prompt templates
pub trait TemplateProvider: Send + Sync {
    /// Current cached template for `name`, if any
    fn get(&self, name: TemplateName) -> Option<CachedTemplate>;

    /// Template for `name`, falling back to the built-in body.
    fn get_or_builtin(&self, name: TemplateName) -> CachedTemplate {
        self.get(name)
            .unwrap_or_else(|| CachedTemplate::builtin(name))
    }
}

/// Provider serving only the built-in templates
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateProvider for BuiltinTemplates {
    fn get(&self, name: TemplateName) -> Option<CachedTemplate> {
        Some(CachedTemplate::builtin(name))
    }
}
