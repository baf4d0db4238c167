//! LLM provider adapters
//!
//! Each adapter implements the [`LlmGateway`](council_application::LlmGateway)
//! port for one wire protocol.

pub mod openai_compat;

pub use openai_compat::{OpenAiCompatGateway, OpenAiCompatSession, OpenAiCompatSettings};
