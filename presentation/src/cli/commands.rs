//! CLI command definitions

use clap::{Parser, ValueEnum};
use council_application::EngineConfig;
use council_domain::{OverflowPolicy, ThresholdMode};
use std::path::PathBuf;

/// Output format for consensus results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with all phases
    Full,
    /// Decision, tally and conditions only
    Decision,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Decision => council_domain::OutputFormat::Decision,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for persona-council
#[derive(Parser, Debug)]
#[command(name = "persona-council")]
#[command(author, version, about = "Persona council - three viewpoints debate and vote on a request")]
#[command(long_about = r#"
Persona Council runs three fixed personas (Analyst, Skeptic, Advocate) over a
request and turns their votes into a decision.

The process has three phases:
1. Thinking: each persona evaluates the request in isolation
2. Debate: each persona responds to the other two, for N rounds
3. Voting: each persona votes APPROVE / DENY / CONDITIONAL

Exit code: 0 approved, 1 denied (or quorum not met), 2 conditional.

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>      Explicit config file
3. ./council.toml       Project-level config
4. ~/.config/persona-council/config.toml   Global config

Example:
  persona-council "Should we ship the new billing service this week?"
  persona-council --rounds 2 --threshold unanimous "Migrate to Postgres 16?"
  persona-council --stream --output full "Adopt trunk-based development?"
"#)]
pub struct Cli {
    /// The request for the council to decide on
    pub prompt: Option<String>,

    /// Number of debate rounds
    #[arg(long, value_name = "N")]
    pub rounds: Option<usize>,

    /// Decision rule
    #[arg(long, value_name = "MODE", value_parser = parse_threshold)]
    pub threshold: Option<ThresholdMode>,

    /// Valid votes required for a decision
    #[arg(long, value_name = "N")]
    pub quorum: Option<usize>,

    /// Stream debate output live to stderr
    #[arg(long)]
    pub stream: bool,

    /// What to do when the stream queue is full
    #[arg(long, value_name = "POLICY", value_parser = parse_overflow)]
    pub overflow: Option<OverflowPolicy>,

    /// Token budget for the voting context
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Append engine events as JSONL to this file
    #[arg(long, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,

    /// Also write diagnostic logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file configuration.
    pub fn apply_overrides(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(rounds) = self.rounds {
            config.debate_rounds = rounds;
        }
        if let Some(mode) = self.threshold {
            config.quorum.threshold_mode = mode;
        }
        if let Some(quorum) = self.quorum {
            config.quorum.quorum_threshold = quorum;
        }
        if self.stream {
            config.streaming.enabled = true;
        }
        if let Some(policy) = self.overflow {
            config.streaming.overflow_policy = policy;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.token_budget.max_tokens = max_tokens;
        }
        config
    }
}

fn parse_threshold(s: &str) -> Result<ThresholdMode, String> {
    s.parse().map_err(|e: council_domain::DomainError| e.to_string())
}

fn parse_overflow(s: &str) -> Result<OverflowPolicy, String> {
    s.parse().map_err(|e: council_domain::DomainError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_flag_set() {
        let cli = Cli::try_parse_from([
            "persona-council",
            "--rounds",
            "3",
            "--threshold",
            "unanimous",
            "--quorum",
            "3",
            "--stream",
            "--overflow",
            "backpressure",
            "--max-tokens",
            "500",
            "--output",
            "json",
            "-vv",
            "ship it?",
        ])
        .unwrap();

        assert_eq!(cli.prompt.as_deref(), Some("ship it?"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);

        let config = cli.apply_overrides(EngineConfig::default());
        assert_eq!(config.debate_rounds, 3);
        assert_eq!(config.quorum.threshold_mode, ThresholdMode::Unanimous);
        assert_eq!(config.quorum.quorum_threshold, 3);
        assert!(config.streaming.enabled);
        assert_eq!(config.streaming.overflow_policy, OverflowPolicy::Backpressure);
        assert_eq!(config.token_budget.max_tokens, 500);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::try_parse_from(["persona-council", "q"]).unwrap();
        let base = EngineConfig::default().with_debate_rounds(2);
        assert_eq!(cli.apply_overrides(base.clone()), base);
    }

    #[test]
    fn test_unknown_threshold_is_rejected() {
        let result = Cli::try_parse_from(["persona-council", "--threshold", "most", "q"]);
        assert!(result.is_err());
    }
}
