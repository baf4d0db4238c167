//! Port for structured audit logging.
//!
//! Defines the [`AuditLogger`] trait for recording [`EngineEvent`]s to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! machine-readable audit trail (JSONL).

use council_domain::EngineEvent;

/// Port for logging engine events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible so that logging
/// failures never disrupt a run.
pub trait AuditLogger: Send + Sync {
    /// Record an engine event.
    fn log(&self, event: &EngineEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: &EngineEvent) {}
}
