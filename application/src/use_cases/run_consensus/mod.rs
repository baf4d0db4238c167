//! Run Consensus use case
//!
//! Orchestrates the persona council through its phases:
//!
//! | Phase | Calls | Input | Failure handling |
//! |-------|-------|-------|------------------|
//! | 1. Thinking | `think` × 3, concurrent | the request only | failed persona omitted |
//! | 2. Debate | `debate` × 3 per round, rounds sequential | others' thinking + previous round | failed persona omitted; streaming overrun stops further rounds |
//! | 3. Voting | `vote` × 3, concurrent, with retries | budget-enforced discussion | exclusion; below quorum fails safe to Denied |
//!
//! Every transition is recorded as a `phase.transition` event. Running
//! never fails: [`ConsensusEngine::execute`] always returns a
//! [`ConsensusResult`].

mod debate;
mod thinking;
mod types;
mod voting;


pub use types::{EngineError, PersonaAgents};

use crate::config::EngineConfig;
use crate::consensus::{ConcurrencyController, ConcurrencyMetrics, EventLog, QuorumManager};
use crate::ports::agent::PersonaAgent;
use crate::ports::audit_logger::AuditLogger;
use crate::ports::observer::{ConsensusObserver, NoObserver};
use crate::ports::stream_sink::{NullSink, StreamSink};
use crate::ports::template_provider::TemplateProvider;
use council_domain::{
    ConsensusResult, ContextManager, EngineEvent, EventType, Persona, Phase, PhaseMachine,
    PhaseTransition, ReductionLog, TokenBudgetManager,
};
use std::sync::Arc;
use tracing::{error, info};

/// The consensus orchestration engine
///
/// One engine owns its per-run state (phase machine, context, quorum
/// bookkeeping, events); `execute` takes `&mut self`, so runs on one
/// engine never overlap.
pub struct ConsensusEngine {
    agents: PersonaAgents,
    config: EngineConfig,
    templates: Arc<dyn TemplateProvider>,
    stream_sink: Arc<dyn StreamSink>,
    observer: Arc<dyn ConsensusObserver>,
    gate: ConcurrencyController,
    budget: TokenBudgetManager,
    events: EventLog,

    // ==================== Per-run state ====================
    phase: PhaseMachine,
    context: ContextManager,
    quorum: QuorumManager,
    reductions: Vec<ReductionLog>,
    streaming_aborted: bool,
}

impl ConsensusEngine {
    pub fn new(
        agents: Vec<Arc<dyn PersonaAgent>>,
        config: EngineConfig,
        templates: Arc<dyn TemplateProvider>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let agents = PersonaAgents::new(agents)?;

        Ok(Self {
            gate: ConcurrencyController::new(
                config.concurrency.max_concurrent,
                config.concurrency.acquire_timeout,
            ),
            budget: TokenBudgetManager::new(config.token_budget),
            quorum: QuorumManager::new(agents.len(), config.quorum),
            agents,
            config,
            templates,
            stream_sink: Arc::new(NullSink),
            observer: Arc::new(NoObserver),
            events: EventLog::default(),
            phase: PhaseMachine::new(),
            context: ContextManager::new(),
            reductions: Vec::new(),
            streaming_aborted: false,
        })
    }

    pub fn with_stream_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.stream_sink = sink;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConsensusObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Forward every event to `audit`.
    ///
    /// Replaces the event log, so call this before [`Self::subscribe`].
    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.events = EventLog::new(audit);
        self
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Event log of the current (or last) run
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Live event feed
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn current_phase(&self) -> Phase {
        self.phase.current()
    }

    pub fn phase_history(&self) -> &[PhaseTransition] {
        self.phase.history()
    }

    pub fn concurrency_metrics(&self) -> ConcurrencyMetrics {
        self.gate.metrics()
    }

    /// Whether the last run's debate was cut short by the streaming budget
    pub fn streaming_aborted(&self) -> bool {
        self.streaming_aborted
    }

    // ==================== Execution ====================

    /// Run the full council on `prompt`.
    pub async fn execute(&mut self, prompt: &str) -> ConsensusResult {
        self.reset_run(prompt);
        info!(
            personas = Persona::COUNT,
            debate_rounds = self.config.debate_rounds,
            threshold = %self.config.quorum.threshold_mode,
            "Starting consensus run"
        );

        let thinking = self.phase_thinking().await;
        self.transition(Phase::Debate);

        let rounds = self.phase_debate().await;
        self.transition(Phase::Voting);

        let result = self.phase_voting(prompt, thinking, rounds).await;
        info!(
            decision = %result.decision,
            exit_code = result.exit_code,
            fail_safe = result.fail_safe,
            "Consensus run complete"
        );
        result
    }

    fn reset_run(&mut self, prompt: &str) {
        self.phase = PhaseMachine::new();
        self.context.reset(prompt);
        self.quorum.reset();
        self.reductions.clear();
        self.streaming_aborted = false;
        self.events.clear();
    }

    fn transition(&mut self, to: Phase) {
        match self.phase.transition_to(to) {
            Ok(transition) => {
                info!(from = %transition.from, to = %transition.to, "Phase transition");
                self.events
                    .record(EngineEvent::phase_transition(transition.from, transition.to));
            }
            Err(e) => error!(error = %e, "Rejected phase transition"),
        }
    }

    fn record_agent_error(&self, phase: Phase, persona: Persona, message: &str) {
        self.events.record(
            EngineEvent::new(EventType::AgentError)
                .with_phase(phase)
                .with_persona(persona)
                .with_reason(message),
        );
    }
}
