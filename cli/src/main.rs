//! CLI entrypoint for Persona Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use council_application::{
    AuditLogger, BuiltinTemplates, ConsensusEngine, ConsensusObserver, LlmGateway,
    LlmPersonaAgent, NoObserver, PersonaAgent, TemplateProvider,
};
use council_domain::{OutputFormat, Persona};
use council_infrastructure::{
    ConfigLoader, FileConfig, FileTemplateProvider, JsonlAuditLogger, OpenAiCompatGateway,
    OpenAiCompatSettings,
};
use council_presentation::{
    Cli, ConsoleFormatter, ConsoleStreamSink, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber.
///
/// The returned guard flushes the log file when dropped.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "persona-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn build_gateway(config: &FileConfig) -> Result<Arc<dyn LlmGateway>> {
    let provider = &config.provider;
    let settings = OpenAiCompatSettings::new(&provider.base_url)
        .with_api_key_from_env(&provider.api_key_env)
        .with_timeout(Duration::from_secs(provider.timeout_seconds))
        .with_sampling(provider.temperature, provider.max_tokens);
    if settings.api_key.is_none() {
        warn!(env = %provider.api_key_env, "No API key found, sending unauthenticated requests");
    }
    Ok(Arc::new(OpenAiCompatGateway::new(settings)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };
    file_config.validate()?;

    let config = cli.apply_overrides(file_config.to_engine_config()?);
    config.validate()?;

    let prompt = match cli.prompt.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => bail!("A prompt is required. Run with --help for usage."),
    };

    if !file_config.output.color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(file_config.output.format)
        .unwrap_or_default();

    info!(
        rounds = config.debate_rounds,
        threshold = %config.quorum.threshold_mode,
        quorum = config.quorum.quorum_threshold,
        streaming = config.streaming.enabled,
        "Starting Persona Council"
    );

    // === Dependency Injection ===
    let gateway = build_gateway(&file_config)?;

    let templates: Arc<dyn TemplateProvider> = match &file_config.templates.dir {
        Some(dir) => Arc::new(FileTemplateProvider::new(dir)),
        None => Arc::new(BuiltinTemplates),
    };

    let agents: Vec<Arc<dyn PersonaAgent>> = Persona::ALL
        .into_iter()
        .map(|persona| {
            Arc::new(LlmPersonaAgent::new(
                persona,
                file_config.model_for(persona),
                gateway.clone(),
                templates.clone(),
            )) as Arc<dyn PersonaAgent>
        })
        .collect();

    let streaming = config.streaming.enabled;
    let mut engine = ConsensusEngine::new(agents, config, templates)?;

    let audit_path = cli.audit_log.clone().or(file_config.audit.path.clone());
    if let Some(path) = audit_path {
        match JsonlAuditLogger::new(&path) {
            Some(logger) => {
                engine = engine.with_audit_logger(Arc::new(logger) as Arc<dyn AuditLogger>);
            }
            None => warn!(path = %path.display(), "Audit log disabled"),
        }
    }

    let show_progress =
        !cli.quiet && file_config.output.show_progress && format != OutputFormat::Json;
    let observer: Arc<dyn ConsensusObserver> = match (show_progress, streaming) {
        (false, _) => Arc::new(NoObserver),
        (true, true) => Arc::new(SimpleProgress),
        (true, false) => Arc::new(ProgressReporter::new()),
    };
    engine = engine.with_observer(observer);

    if streaming {
        engine = engine.with_stream_sink(Arc::new(ConsoleStreamSink::new()));
    }

    let result = engine.execute(&prompt).await;

    println!("{}", ConsoleFormatter.render(&result, format));

    let exit_code = result.exit_code;
    drop(guard);
    std::process::exit(exit_code)
}
