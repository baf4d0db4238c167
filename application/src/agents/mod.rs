//! Persona agent implementations

pub mod llm;

pub use llm::LlmPersonaAgent;
