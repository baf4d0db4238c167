//! Application layer for persona-council
//!
//! This crate contains the consensus engine, its building blocks, port
//! definitions and engine configuration. It depends only on the domain
//! layer.

pub mod agents;
pub mod config;
pub mod consensus;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use agents::LlmPersonaAgent;
pub use config::{ConcurrencySettings, EngineConfig, QuorumSettings, StreamingSettings};
pub use consensus::{
    ConcurrencyController, ConcurrencyError, ConcurrencyMetrics, EventLog, QuorumManager,
    StreamingEmitter, StreamingError,
};
pub use ports::{
    agent::{AgentError, DeltaSender, PersonaAgent},
    audit_logger::{AuditLogger, NoAuditLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession, StreamHandle},
    observer::{ConsensusObserver, NoObserver},
    stream_sink::{NullSink, SinkError, StreamSink},
    template_provider::{BuiltinTemplates, CachedTemplate, TemplateProvider},
};
pub use use_cases::run_consensus::{ConsensusEngine, EngineError, PersonaAgents};
