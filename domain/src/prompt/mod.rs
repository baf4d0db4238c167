//! Prompt domain
//!
//! Templates for each phase and parsing of persona responses.

pub mod parsing;
mod template;

pub use parsing::parse_debate_sections;
pub use template::{BUILTIN_TEMPLATE_VERSION, PromptTemplate, TemplateName};
