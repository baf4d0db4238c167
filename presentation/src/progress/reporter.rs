//! Progress reporting for consensus runs

use colored::Colorize;
use council_application::ConsensusObserver;
use council_domain::{Persona, Phase};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a consensus run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_display_name(phase: &Phase) -> &'static str {
        match phase {
            Phase::Thinking => "Phase 1: Independent Thinking",
            Phase::Debate => "Phase 2: Debate",
            Phase::Voting => "Phase 3: Voting",
            Phase::Completed => "Completed",
        }
    }

    fn phase_short_name(phase: &Phase) -> &'static str {
        match phase {
            Phase::Thinking => "Phase 1",
            Phase::Debate => "Phase 2",
            Phase::Voting => "Phase 3",
            Phase::Completed => "Run",
        }
    }

    fn persona_status(persona: Persona, success: bool) -> String {
        if success {
            format!("{} {}", "v".green(), persona.display_name())
        } else {
            format!("{} {}", "x".red(), persona.display_name())
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusObserver for ProgressReporter {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_display_name(phase).to_string());
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.phase_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_persona_complete(&self, _phase: &Phase, persona: Persona, success: bool) {
        if let Ok(bar) = self.phase_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(Self::persona_status(persona, success));
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: &Phase) {
        if let Ok(mut bar) = self.phase_bar.lock()
            && let Some(pb) = bar.take()
        {
            let phase_name = Self::phase_short_name(phase);
            pb.finish_with_message(format!("{} complete!", phase_name.green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
///
/// Writes to stderr so that stdout carries only the result.
pub struct SimpleProgress;

impl ConsensusObserver for SimpleProgress {
    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        eprintln!(
            "{} {} ({} personas)",
            "->".cyan(),
            ProgressReporter::phase_display_name(phase).bold(),
            total_tasks
        );
    }

    fn on_persona_complete(&self, _phase: &Phase, persona: Persona, success: bool) {
        if success {
            eprintln!("  {}", ProgressReporter::persona_status(persona, true));
        } else {
            eprintln!(
                "  {} (failed)",
                ProgressReporter::persona_status(persona, false)
            );
        }
    }

    fn on_phase_complete(&self, _phase: &Phase) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(
            ProgressReporter::phase_display_name(&Phase::Debate),
            "Phase 2: Debate"
        );
        assert_eq!(ProgressReporter::phase_short_name(&Phase::Voting), "Phase 3");
    }

    #[test]
    fn test_reporter_tracks_phase_bar() {
        let reporter = ProgressReporter::new();
        reporter.on_phase_start(&Phase::Thinking, 3);
        reporter.on_persona_complete(&Phase::Thinking, Persona::Analyst, true);
        reporter.on_persona_complete(&Phase::Thinking, Persona::Skeptic, false);
        {
            let bar = reporter.phase_bar.lock().unwrap();
            assert_eq!(bar.as_ref().unwrap().position(), 2);
        }
        reporter.on_phase_complete(&Phase::Thinking);
        assert!(reporter.phase_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_persona_status_marks_failure() {
        colored::control::set_override(false);
        assert_eq!(ProgressReporter::persona_status(Persona::Advocate, true), "v Advocate");
        assert_eq!(ProgressReporter::persona_status(Persona::Skeptic, false), "x Skeptic");
    }
}
