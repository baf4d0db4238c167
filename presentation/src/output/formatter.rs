//! Output formatter trait

use council_domain::{ConsensusResult, OutputFormat};

/// Trait for formatting consensus results
pub trait OutputFormatter {
    /// Format the complete result, every phase included
    fn format(&self, result: &ConsensusResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &ConsensusResult) -> String;

    /// Format the decision only (concise output)
    fn format_decision_only(&self, result: &ConsensusResult) -> String;

    /// Dispatch on `format`.
    fn render(&self, result: &ConsensusResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(result),
            OutputFormat::Decision => self.format_decision_only(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
