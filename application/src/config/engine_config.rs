//! Consensus engine configuration.
//!
//! [`EngineConfig`] groups every knob the engine reads during a run. It is
//! passed to the engine's constructor by value; nothing is read from
//! process-wide state.
//!
//! | Group | Fields |
//! |-------|--------|
//! | top level | `debate_rounds` |
//! | [`QuorumSettings`] | threshold mode, quorum threshold, retry counts |
//! | [`TokenBudget`] | max tokens, tokens per char, rate override |
//! | [`StreamingSettings`] | enabled, capacity, overflow policy, timeouts |
//! | [`ConcurrencySettings`] | max concurrent calls, acquire timeout |

use council_domain::{DomainError, OverflowPolicy, Persona, ThresholdMode, TokenBudget};
use std::time::Duration;

/// Quorum and retry settings for the Voting phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumSettings {
    pub threshold_mode: ThresholdMode,
    /// Valid votes required for a decision
    pub quorum_threshold: usize,
    /// Outer retries beyond the first attempt
    pub retry_count: usize,
    /// Extra attempts after a schema rejection
    pub schema_retry_count: usize,
}

impl Default for QuorumSettings {
    fn default() -> Self {
        Self {
            threshold_mode: ThresholdMode::Majority,
            quorum_threshold: 2,
            retry_count: 2,
            schema_retry_count: 2,
        }
    }
}

/// Live debate streaming settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingSettings {
    pub enabled: bool,
    /// Queue capacity in chunks
    pub capacity: usize,
    pub overflow_policy: OverflowPolicy,
    /// How long a backpressured producer waits for space
    pub emit_timeout: Duration,
    /// Per-chunk deadline for the sink
    pub send_timeout: Duration,
    /// Ceiling on streamed debate text; defaults to the token budget
    pub max_debate_tokens: Option<usize>,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 64,
            overflow_policy: OverflowPolicy::Drop,
            emit_timeout: Duration::from_secs(2),
            send_timeout: Duration::from_secs(5),
            max_debate_tokens: None,
        }
    }
}

/// Admission gate settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencySettings {
    pub max_concurrent: usize,
    pub acquire_timeout: Duration,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self {
            max_concurrent: Persona::COUNT,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the consensus engine needs to know about a run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub debate_rounds: usize,
    pub quorum: QuorumSettings,
    pub token_budget: TokenBudget,
    pub streaming: StreamingSettings,
    pub concurrency: ConcurrencySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debate_rounds: 1,
            quorum: QuorumSettings::default(),
            token_budget: TokenBudget::default(),
            streaming: StreamingSettings::default(),
            concurrency: ConcurrencySettings::default(),
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_debate_rounds(mut self, rounds: usize) -> Self {
        self.debate_rounds = rounds;
        self
    }

    pub fn with_threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.quorum.threshold_mode = mode;
        self
    }

    pub fn with_quorum_threshold(mut self, threshold: usize) -> Self {
        self.quorum.quorum_threshold = threshold;
        self
    }

    pub fn with_retries(mut self, retry_count: usize, schema_retry_count: usize) -> Self {
        self.quorum.retry_count = retry_count;
        self.quorum.schema_retry_count = schema_retry_count;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.token_budget.max_tokens = max_tokens;
        self
    }

    pub fn with_streaming(mut self, streaming: StreamingSettings) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencySettings) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Token ceiling for streamed debate text
    pub fn debate_stream_budget(&self) -> usize {
        self.streaming
            .max_debate_tokens
            .unwrap_or(self.token_budget.max_tokens)
    }

    // ==================== Validation ====================

    /// Collect every configuration problem.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.debate_rounds == 0 {
            issues.push("debate_rounds must be at least 1".to_string());
        }
        if !(1..=Persona::COUNT).contains(&self.quorum.quorum_threshold) {
            issues.push(format!(
                "quorum_threshold ({}) must be between 1 and {}",
                self.quorum.quorum_threshold,
                Persona::COUNT
            ));
        }
        if self.streaming.capacity == 0 {
            issues.push("streaming capacity must be at least 1".to_string());
        }
        if self.concurrency.max_concurrent == 0 {
            issues.push("max_concurrent must be at least 1".to_string());
        }
        issues.extend(self.token_budget.validate());
        issues
    }

    /// Reject invalid configurations.
    pub fn validate(&self) -> Result<(), DomainError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidConfig(issues.join("; ")))
        }
    }
}
