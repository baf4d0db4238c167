//! Stream sink port
//!
//! The external consumer of live debate output (console, websocket).

use async_trait::async_trait;
use council_domain::StreamChunk;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,

    #[error("Sink write failed: {0}")]
    Write(String),
}

/// Receives chunks from the streaming emitter's worker
#[async_trait]
pub trait StreamSink: Send + Sync {
    async fn send(&self, chunk: &StreamChunk) -> Result<(), SinkError>;
}

/// Sink that discards everything
pub struct NullSink;

#[async_trait]
impl StreamSink for NullSink {
    async fn send(&self, _chunk: &StreamChunk) -> Result<(), SinkError> {
        Ok(())
    }
}
