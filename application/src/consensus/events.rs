//! Append-only engine event log.
//!
//! Events are kept for snapshot reads, fanned out to live subscribers
//! through a broadcast channel and forwarded to the [`AuditLogger`].

use crate::ports::audit_logger::{AuditLogger, NoAuditLogger};
use council_domain::{EngineEvent, EventType};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

const BROADCAST_CAPACITY: usize = 256;

struct Inner {
    events: Mutex<Vec<EngineEvent>>,
    sender: broadcast::Sender<EngineEvent>,
    audit: Arc<dyn AuditLogger>,
}

/// Shared handle to the event log of one engine
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Inner>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(Arc::new(NoAuditLogger))
    }
}

impl EventLog {
    pub fn new(audit: Arc<dyn AuditLogger>) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                events: Mutex::new(Vec::new()),
                sender,
                audit,
            }),
        }
    }

    fn events(&self) -> MutexGuard<'_, Vec<EngineEvent>> {
        self.inner
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an event.
    pub fn record(&self, event: EngineEvent) {
        debug!(
            event_type = %event.event_type,
            phase = ?event.phase,
            persona = ?event.persona,
            "Engine event"
        );
        self.inner.audit.log(&event);
        self.events().push(event.clone());
        // No subscribers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Receive events recorded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.sender.subscribe()
    }

    /// Copy of every event recorded so far
    pub fn snapshot(&self) -> Vec<EngineEvent> {
        self.events().clone()
    }

    pub fn of_type(&self, event_type: EventType) -> Vec<EngineEvent> {
        self.events()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    /// Forget previous runs' events.
    pub fn clear(&self) {
        self.events().clear();
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}
