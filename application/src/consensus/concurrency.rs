//! Concurrency Controller
//!
//! Bounded admission gate for outbound agent calls. Every think, debate
//! and vote call holds a [`ConcurrencyPermit`] while it runs; acquiring one
//! can time out, which callers treat like a failed call.

use crate::ports::agent::AgentError;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConcurrencyError {
    #[error("Timed out after {0:?} waiting for a concurrency slot")]
    AcquireTimeout(Duration),

    #[error("Concurrency controller closed")]
    Closed,
}

impl From<ConcurrencyError> for AgentError {
    fn from(e: ConcurrencyError) -> Self {
        match e {
            ConcurrencyError::AcquireTimeout(_) => AgentError::Timeout(e.to_string()),
            ConcurrencyError::Closed => AgentError::Unavailable(e.to_string()),
        }
    }
}

/// Point-in-time counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConcurrencyMetrics {
    pub max_concurrent: usize,
    pub active: usize,
    pub peak: usize,
    pub acquired: usize,
    pub timeouts: usize,
}

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    peak: AtomicUsize,
    acquired: AtomicUsize,
    timeouts: AtomicUsize,
}

/// Semaphore-backed admission gate, cheap to clone
#[derive(Debug, Clone)]
pub struct ConcurrencyController {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    acquire_timeout: Duration,
    counters: Arc<Counters>,
}

/// Slot held for the duration of one call
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyController {
    pub fn new(max_concurrent: usize, acquire_timeout: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            acquire_timeout,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Acquire a slot using the configured timeout.
    pub async fn acquire(&self) -> Result<ConcurrencyPermit, ConcurrencyError> {
        self.acquire_with_timeout(self.acquire_timeout).await
    }

    pub async fn acquire_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<ConcurrencyPermit, ConcurrencyError> {
        let permit = match tokio::time::timeout(timeout, self.semaphore.clone().acquire_owned())
            .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(ConcurrencyError::Closed),
            Err(_) => {
                self.counters.timeouts.fetch_add(1, Ordering::SeqCst);
                warn!(timeout_ms = timeout.as_millis() as u64, "Concurrency acquire timed out");
                return Err(ConcurrencyError::AcquireTimeout(timeout));
            }
        };

        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(active, Ordering::SeqCst);
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        debug!(active, max = self.max_concurrent, "Concurrency slot acquired");

        Ok(ConcurrencyPermit {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    /// Run `fut` inside an acquired slot.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ConcurrencyError>
    where
        F: std::future::Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(fut.await)
    }

    /// Stop admitting new calls; waiting acquirers fail with `Closed`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn metrics(&self) -> ConcurrencyMetrics {
        ConcurrencyMetrics {
            max_concurrent: self.max_concurrent,
            active: self.counters.active.load(Ordering::SeqCst),
            peak: self.counters.peak.load(Ordering::SeqCst),
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            timeouts: self.counters.timeouts.load(Ordering::SeqCst),
        }
    }
}
