//! Progress observer port
//!
//! Defines the interface for reporting progress during a consensus run.

use council_domain::{Persona, Phase};

/// Callback for progress updates during a consensus run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ConsensusObserver: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize);

    /// Called when one persona's call completes within a phase
    fn on_persona_complete(&self, phase: &Phase, persona: Persona, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &Phase);
}

/// No-op observer for when progress reporting is not needed
pub struct NoObserver;

impl ConsensusObserver for NoObserver {
    fn on_phase_start(&self, _phase: &Phase, _total_tasks: usize) {}
    fn on_persona_complete(&self, _phase: &Phase, _persona: Persona, _success: bool) {}
    fn on_phase_complete(&self, _phase: &Phase) {}
}
