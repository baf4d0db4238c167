//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent;
pub mod audit_logger;
pub mod llm_gateway;
pub mod observer;
pub mod stream_sink;
pub mod template_provider;
