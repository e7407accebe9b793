//! CLI entrypoint for callgate
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use callgate_application::{AutoApproveConfirmation, ConfirmationPort, RunTurnUseCase};
use callgate_domain::ConversationContext;
use callgate_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, OpenAiChatGateway, default_registry,
};
use callgate_presentation::{ChatRepl, Cli, InteractiveConfirmation};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `-v`. With `--log-file` diagnostics go to that file
/// so they never interleave with streamed replies; the returned guard must
/// live until exit to flush it.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} does not name a file", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        let list = issues
            .iter()
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("invalid configuration:\n{}", list);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;
    info!("Starting callgate");

    let config = load_config(&cli)?;

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiChatGateway::from_config(&config.provider));
    let registry = Arc::new(default_registry(&config).context("failed to register functions")?);

    let confirmation: Arc<dyn ConfirmationPort> = if cli.yes || config.confirmation.auto_approve {
        info!("Write operations are auto-approved");
        Arc::new(AutoApproveConfirmation)
    } else {
        Arc::new(InteractiveConfirmation::new())
    };

    let mut use_case =
        RunTurnUseCase::new(gateway, registry, confirmation).with_params(config.turn_params());

    let transcript = cli
        .conversation_log
        .clone()
        .or_else(|| config.logging.conversation_log.as_ref().map(PathBuf::from));
    if let Some(path) = transcript {
        match JsonlConversationLogger::open(&path) {
            Ok(logger) => {
                info!(path = %path.display(), "Writing conversation transcript");
                use_case = use_case.with_conversation_logger(Arc::new(logger));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Transcript disabled"),
        }
    }

    let context = match &config.assistant.system_prompt {
        Some(prompt) => ConversationContext::with_system_prompt(prompt.clone()),
        None => ConversationContext::new(),
    };

    let mut repl = ChatRepl::new(use_case, context);
    if let Some(path) = &config.repl.history_file {
        repl = repl.with_history_file(Some(PathBuf::from(path)));
    }

    match cli.prompt {
        Some(prompt) => match repl.run_turn(&prompt).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_cancelled() => {
                eprintln!("Turn cancelled.");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        None => {
            repl.run().await?;
            Ok(())
        }
    }
}
