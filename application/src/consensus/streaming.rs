//! Streaming Emitter
//!
//! Bounded, ordered queue of [`StreamChunk`]s between the debate phase
//! (producer) and a single worker task that forwards chunks to a
//! [`StreamSink`] (consumer).
//!
//! # Overflow
//!
//! | Policy | Queue full |
//! |--------|-----------|
//! | `drop` | evict the oldest normal chunk; if only critical chunks are queued, drop an incoming normal chunk (or the oldest critical one for an incoming critical chunk) |
//! | `backpressure` | wait up to `emit_timeout` for space, then fail with [`StreamingError::BackpressureTimeout`] |
//!
//! Every lost chunk increments the drop counter and records a
//! `streaming.drop` or `streaming.timeout` event.
//!
//! A slow sink never stalls the producer beyond the queue bound: each send
//! is limited to `send_timeout`, after which the worker logs a warning and
//! moves on.

use super::events::EventLog;
use crate::config::StreamingSettings;
use crate::ports::stream_sink::StreamSink;
use council_domain::{EngineEvent, EventType, OverflowPolicy, Phase, StreamChunk};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const REASON_OLDEST_NORMAL: &str = "queue_full_oldest_normal";
pub const REASON_INCOMING_NORMAL: &str = "queue_full_incoming_normal";
pub const REASON_OLDEST_CRITICAL: &str = "queue_full_oldest_critical";
pub const REASON_BACKPRESSURE_TIMEOUT: &str = "backpressure_timeout";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamingError {
    #[error("No queue space within {0:?} (backpressure)")]
    BackpressureTimeout(Duration),

    #[error("Streaming emitter is shut down")]
    Closed,
}

/// Emitter counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitterStats {
    pub queued: usize,
    pub sent: usize,
    pub dropped: usize,
    pub send_timeouts: usize,
}

struct Shared {
    queue: Mutex<VecDeque<StreamChunk>>,
    capacity: usize,
    policy: OverflowPolicy,
    emit_timeout: Duration,
    send_timeout: Duration,
    /// Signalled when the worker frees a slot
    space: Notify,
    /// Signalled when a chunk is queued
    items: Notify,
    sent: AtomicUsize,
    dropped: AtomicUsize,
    send_timeouts: AtomicUsize,
    closed: AtomicBool,
    cancel: CancellationToken,
    sink: Arc<dyn StreamSink>,
    events: EventLog,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<StreamChunk>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_loss(&self, event_type: EventType, reason: &str, chunk: &StreamChunk) {
        let total = self.dropped.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(reason, dropped_total = total, "Stream chunk dropped");

        let mut event = EngineEvent::new(event_type)
            .with_phase(Phase::Debate)
            .with_reason(reason)
            .with_field("dropped_total", total);
        if let Some(persona) = chunk.persona {
            event = event.with_persona(persona);
        }
        if let Some(round) = chunk.round {
            event = event.with_field("round", round);
        }
        self.events.record(event);
    }
}

/// Bounded channel with an overflow policy and one sending worker
pub struct StreamingEmitter {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl StreamingEmitter {
    /// Create an emitter without starting its worker.
    pub fn new(settings: &StreamingSettings, sink: Arc<dyn StreamSink>, events: EventLog) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(settings.capacity)),
                capacity: settings.capacity.max(1),
                policy: settings.overflow_policy,
                emit_timeout: settings.emit_timeout,
                send_timeout: settings.send_timeout,
                space: Notify::new(),
                items: Notify::new(),
                sent: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
                send_timeouts: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                sink,
                events,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Create an emitter and start its worker.
    pub fn start(settings: &StreamingSettings, sink: Arc<dyn StreamSink>, events: EventLog) -> Self {
        let emitter = Self::new(settings, sink, events);
        emitter.spawn_worker();
        emitter
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start the consuming worker (no-op if already running).
    pub fn spawn_worker(&self) {
        let mut slot = self.worker_slot();
        if slot.is_none() {
            let shared = self.shared.clone();
            *slot = Some(tokio::spawn(run_worker(shared)));
        }
    }

    /// Queue a chunk according to the overflow policy.
    pub async fn emit(&self, chunk: StreamChunk) -> Result<(), StreamingError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(StreamingError::Closed);
        }
        match self.shared.policy {
            OverflowPolicy::Drop => {
                self.emit_dropping(chunk);
                Ok(())
            }
            OverflowPolicy::Backpressure => self.emit_waiting(chunk).await,
        }
    }

    fn emit_dropping(&self, chunk: StreamChunk) {
        let shared = &self.shared;
        let mut queue = shared.queue();

        if queue.len() < shared.capacity {
            queue.push_back(chunk);
            drop(queue);
            shared.items.notify_one();
            return;
        }

        if let Some(pos) = queue.iter().position(|c| !c.is_critical()) {
            let evicted = queue.remove(pos);
            queue.push_back(chunk);
            drop(queue);
            if let Some(evicted) = evicted {
                shared.record_loss(EventType::StreamingDrop, REASON_OLDEST_NORMAL, &evicted);
            }
        } else if !chunk.is_critical() {
            drop(queue);
            shared.record_loss(EventType::StreamingDrop, REASON_INCOMING_NORMAL, &chunk);
            return;
        } else {
            let evicted = queue.pop_front();
            queue.push_back(chunk);
            drop(queue);
            if let Some(evicted) = evicted {
                shared.record_loss(EventType::StreamingDrop, REASON_OLDEST_CRITICAL, &evicted);
            }
        }
        shared.items.notify_one();
    }

    async fn emit_waiting(&self, chunk: StreamChunk) -> Result<(), StreamingError> {
        let shared = &self.shared;
        let deadline = Instant::now() + shared.emit_timeout;

        loop {
            let notified = shared.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut queue = shared.queue();
                if queue.len() < shared.capacity {
                    queue.push_back(chunk);
                    drop(queue);
                    shared.items.notify_one();
                    return Ok(());
                }
            }

            if shared.closed.load(Ordering::SeqCst) {
                return Err(StreamingError::Closed);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                warn!(
                    timeout_ms = shared.emit_timeout.as_millis() as u64,
                    "Stream queue full, backpressure timeout"
                );
                shared.record_loss(
                    EventType::StreamingTimeout,
                    REASON_BACKPRESSURE_TIMEOUT,
                    &chunk,
                );
                return Err(StreamingError::BackpressureTimeout(shared.emit_timeout));
            }
        }
    }

    /// Chunks currently waiting, oldest first
    pub fn queued(&self) -> Vec<StreamChunk> {
        self.shared.queue().iter().cloned().collect()
    }

    pub fn stats(&self) -> EmitterStats {
        EmitterStats {
            queued: self.shared.queue().len(),
            sent: self.shared.sent.load(Ordering::SeqCst),
            dropped: self.shared.dropped.load(Ordering::SeqCst),
            send_timeouts: self.shared.send_timeouts.load(Ordering::SeqCst),
        }
    }

    /// Wait until the worker has taken every queued chunk, up to `timeout`.
    ///
    /// Returns `true` if the queue emptied in time.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.shared.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.queue().is_empty() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.shared.queue().is_empty();
            }
        }
    }

    /// Stop the worker and discard whatever is still queued.
    ///
    /// An in-flight send is allowed to finish (bounded by the send
    /// timeout). Returns the number of discarded chunks.
    pub async fn shutdown(&self) -> usize {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.cancel.cancel();
        self.shared.space.notify_waiters();

        let handle = self.worker_slot().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Streaming worker ended abnormally");
        }

        let mut queue = self.shared.queue();
        let discarded = queue.len();
        queue.clear();
        if discarded > 0 {
            debug!(discarded, "Discarded queued stream chunks on shutdown");
        }
        discarded
    }
}

impl Drop for StreamingEmitter {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

async fn run_worker(shared: Arc<Shared>) {
    loop {
        let Some(chunk) = next_chunk(&shared).await else {
            break;
        };

        match tokio::time::timeout(shared.send_timeout, shared.sink.send(&chunk)).await {
            Ok(Ok(())) => {
                shared.sent.fetch_add(1, Ordering::SeqCst);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Stream sink rejected chunk");
            }
            Err(_) => {
                shared.send_timeouts.fetch_add(1, Ordering::SeqCst);
                warn!(
                    timeout_ms = shared.send_timeout.as_millis() as u64,
                    persona = ?chunk.persona,
                    "Stream sink send timed out, continuing with next chunk"
                );
            }
        }
    }
    debug!("Streaming worker stopped");
}

/// Pop the next chunk, waiting for one; `None` once cancelled.
async fn next_chunk(shared: &Shared) -> Option<StreamChunk> {
    loop {
        if shared.cancel.is_cancelled() {
            return None;
        }

        let notified = shared.items.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let popped = shared.queue().pop_front();
        if let Some(chunk) = popped {
            shared.space.notify_one();
            return Some(chunk);
        }

        tokio::select! {
            _ = &mut notified => {}
            _ = shared.cancel.cancelled() => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::stream_sink::SinkError;
    use async_trait::async_trait;

    struct RecordingSink {
        received: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
            })
        }

        fn texts(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StreamSink for RecordingSink {
        async fn send(&self, chunk: &StreamChunk) -> Result<(), SinkError> {
            self.received.lock().unwrap().push(chunk.text.clone());
            Ok(())
        }
    }

    /// Sink that never completes a send
    struct StuckSink;

    #[async_trait]
    impl StreamSink for StuckSink {
        async fn send(&self, _chunk: &StreamChunk) -> Result<(), SinkError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn settings(capacity: usize, policy: OverflowPolicy) -> StreamingSettings {
        StreamingSettings {
            enabled: true,
            capacity,
            overflow_policy: policy,
            emit_timeout: Duration::from_millis(30),
            send_timeout: Duration::from_millis(30),
            max_debate_tokens: None,
        }
    }

    fn texts(chunks: &[StreamChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_drop_evicts_oldest_normal_with_blocked_consumer() {
        let events = EventLog::default();
        let k = 4;
        let emitter = StreamingEmitter::new(
            &settings(k, OverflowPolicy::Drop),
            RecordingSink::new(),
            events.clone(),
        );

        for i in 0..=k {
            emitter.emit(StreamChunk::normal(format!("c{}", i))).await.unwrap();
        }

        assert_eq!(emitter.stats().dropped, 1);
        assert_eq!(texts(&emitter.queued()), vec!["c1", "c2", "c3", "c4"]);

        let drops = events.of_type(EventType::StreamingDrop);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].reason.as_deref(), Some(REASON_OLDEST_NORMAL));
        assert_eq!(drops[0].field("dropped_total"), Some(&serde_json::json!(1)));
    }

    #[tokio::test]
    async fn test_drop_prefers_normal_over_critical() {
        let emitter = StreamingEmitter::new(
            &settings(3, OverflowPolicy::Drop),
            RecordingSink::new(),
            EventLog::default(),
        );
        emitter.emit(StreamChunk::critical("round 1")).await.unwrap();
        emitter.emit(StreamChunk::normal("a")).await.unwrap();
        emitter.emit(StreamChunk::critical("round 2")).await.unwrap();
        emitter.emit(StreamChunk::critical("abort")).await.unwrap();

        assert_eq!(texts(&emitter.queued()), vec!["round 1", "round 2", "abort"]);
    }

    #[tokio::test]
    async fn test_drop_incoming_normal_when_only_critical_queued() {
        let events = EventLog::default();
        let emitter = StreamingEmitter::new(
            &settings(2, OverflowPolicy::Drop),
            RecordingSink::new(),
            events.clone(),
        );
        emitter.emit(StreamChunk::critical("x")).await.unwrap();
        emitter.emit(StreamChunk::critical("y")).await.unwrap();
        emitter.emit(StreamChunk::normal("late")).await.unwrap();

        assert_eq!(texts(&emitter.queued()), vec!["x", "y"]);
        let drops = events.of_type(EventType::StreamingDrop);
        assert_eq!(drops[0].reason.as_deref(), Some(REASON_INCOMING_NORMAL));

        emitter.emit(StreamChunk::critical("z")).await.unwrap();
        assert_eq!(texts(&emitter.queued()), vec!["y", "z"]);
        assert_eq!(emitter.stats().dropped, 2);
    }

    #[tokio::test]
    async fn test_backpressure_timeout() {
        let events = EventLog::default();
        let emitter = StreamingEmitter::new(
            &settings(1, OverflowPolicy::Backpressure),
            RecordingSink::new(),
            events.clone(),
        );
        emitter.emit(StreamChunk::normal("first")).await.unwrap();
        let err = emitter.emit(StreamChunk::normal("second")).await.unwrap_err();

        assert_eq!(err, StreamingError::BackpressureTimeout(Duration::from_millis(30)));
        assert_eq!(emitter.stats().dropped, 1);
        let timeouts = events.of_type(EventType::StreamingTimeout);
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].reason.as_deref(), Some(REASON_BACKPRESSURE_TIMEOUT));
    }

    #[tokio::test]
    async fn test_backpressure_waits_for_worker() {
        let sink = RecordingSink::new();
        let emitter = StreamingEmitter::start(
            &settings(1, OverflowPolicy::Backpressure),
            sink.clone(),
            EventLog::default(),
        );
        for i in 0..5 {
            emitter.emit(StreamChunk::normal(format!("c{}", i))).await.unwrap();
        }
        assert!(emitter.flush(Duration::from_secs(1)).await);
        tokio::time::sleep(Duration::from_millis(10)).await;
        emitter.shutdown().await;

        assert_eq!(sink.texts(), vec!["c0", "c1", "c2", "c3", "c4"]);
        assert_eq!(emitter.stats().dropped, 0);
    }

    #[tokio::test]
    async fn test_send_timeout_does_not_block_producer() {
        let emitter = StreamingEmitter::start(
            &settings(2, OverflowPolicy::Drop),
            Arc::new(StuckSink),
            EventLog::default(),
        );
        for i in 0..3 {
            emitter.emit(StreamChunk::normal(format!("c{}", i))).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(emitter.stats().send_timeouts >= 1);
        emitter.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_discards_queue() {
        let emitter = StreamingEmitter::new(
            &settings(4, OverflowPolicy::Drop),
            RecordingSink::new(),
            EventLog::default(),
        );
        emitter.emit(StreamChunk::normal("a")).await.unwrap();
        emitter.emit(StreamChunk::normal("b")).await.unwrap();

        assert_eq!(emitter.shutdown().await, 2);
        assert!(emitter.queued().is_empty());
        assert_eq!(
            emitter.emit(StreamChunk::normal("c")).await,
            Err(StreamingError::Closed)
        );
    }
}
