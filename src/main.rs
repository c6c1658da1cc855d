#![forbid(unsafe_code)]

//! `task-scout` — personal productivity agent binary.
//!
//! Bootstraps configuration, connects the task database, and either runs
//! the polling agent until interrupted or executes one control operation
//! (status, poll, recommend, autonomy, suggestions, stop).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use task_scout::agent::{Agent, ProcessGuard};
use task_scout::audit::JsonlAuditWriter;
use task_scout::config::GlobalConfig;
use task_scout::extract::LlmExtractor;
use task_scout::integrations;
use task_scout::persistence::{db, retention};
use task_scout::policy::AutonomyLevel;
use task_scout::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "task-scout", about = "Personal productivity agent", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the agent and poll until interrupted.
    Run {
        /// Autonomy level override for this session.
        #[arg(long)]
        autonomy: Option<String>,
    },
    /// Print the agent status snapshot.
    Status,
    /// Run one poll cycle immediately.
    Poll,
    /// Run one recommendation pass immediately.
    Recommend,
    /// Set the autonomy level for the operations of this invocation.
    Autonomy {
        /// Level name: suggest, auto_low, auto, or full.
        level: String,
    },
    /// Review pending task suggestions.
    Suggestions {
        #[command(subcommand)]
        action: SuggestionAction,
    },
    /// Signal the running agent instance to stop.
    Stop,
}

#[derive(Debug, Subcommand)]
enum SuggestionAction {
    /// List pending suggestions in review order.
    List,
    /// Approve the n-th pending suggestion (1-based).
    Approve {
        /// Position in the pending list.
        index: usize,
    },
    /// Reject the n-th pending suggestion (1-based).
    Reject {
        /// Position in the pending list.
        index: usize,
    },
    /// Delete every pending suggestion.
    Clear,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await;
    let config = Arc::new(config);

    match args.command {
        Command::Run { autonomy } => {
            let level = autonomy.as_deref().map(AutonomyLevel::parse).transpose()?;
            run_agent(config, level).await
        }
        Command::Status => {
            let agent = build_agent(config).await?;
            print_json(&agent.status().await?)
        }
        Command::Poll => {
            let agent = build_agent(config).await?;
            print_json(&agent.poll_now().await?)
        }
        Command::Recommend => {
            let agent = build_agent(config).await?;
            let count = agent.recommend_now().await?;
            println!("generated {count} recommendation(s)");
            Ok(())
        }
        Command::Autonomy { level } => {
            let level = AutonomyLevel::parse(&level)?;
            let agent = build_agent(config).await?;
            print_json(&agent.set_autonomy(level).await?)
        }
        Command::Suggestions { action } => {
            let agent = build_agent(config).await?;
            match action {
                SuggestionAction::List => print_json(&agent.list_pending_suggestions().await?),
                SuggestionAction::Approve { index } => {
                    let task_id = agent.approve_suggestion(index).await?;
                    println!("created task {task_id}");
                    Ok(())
                }
                SuggestionAction::Reject { index } => {
                    agent.reject_suggestion(index).await?;
                    println!("suggestion rejected");
                    Ok(())
                }
                SuggestionAction::Clear => {
                    let count = agent.clear_pending().await?;
                    println!("cleared {count} pending suggestion(s)");
                    Ok(())
                }
            }
        }
        Command::Stop => {
            let guard = ProcessGuard::new(config.lock_path());
            match guard.stop_holder()? {
                Some(pid) => println!("sent stop signal to agent (pid {pid})"),
                None => println!("no running agent instance found"),
            }
            Ok(())
        }
    }
}

/// Start the agent and block until a shutdown signal arrives.
async fn run_agent(config: Arc<GlobalConfig>, level: Option<AutonomyLevel>) -> Result<()> {
    let pool = Arc::new(db::connect(&config.db_path()).await?);
    let agent = build_agent_with_pool(Arc::clone(&config), Arc::clone(&pool))?;

    let retention_cancel = CancellationToken::new();
    let retention_handle = retention::spawn_retention_task(
        pool,
        config.retention_days,
        retention_cancel.clone(),
    );

    agent.start(level).await?;
    info!("agent running; press ctrl-c to stop");

    shutdown_signal().await;
    info!("shutdown signal received");

    if let Err(err) = agent.stop().await {
        error!(%err, "error stopping agent");
    }
    retention_cancel.cancel();
    let _ = retention_handle.await;
    info!("task-scout shut down");

    Ok(())
}

/// Wire the registry, extractor, audit sink, and repositories together.
async fn build_agent(config: Arc<GlobalConfig>) -> Result<Arc<Agent>> {
    let pool = Arc::new(db::connect(&config.db_path()).await?);
    build_agent_with_pool(config, pool)
}

fn build_agent_with_pool(
    config: Arc<GlobalConfig>,
    pool: Arc<task_scout::persistence::SqlitePool>,
) -> Result<Arc<Agent>> {
    let registry = integrations::build_registry(&config)?;
    let extractor = Arc::new(LlmExtractor::new(
        &config.llm,
        Duration::from_secs(config.timeouts.extract_seconds),
    )?);
    let audit = Arc::new(JsonlAuditWriter::new(config.decision_log_dir())?);

    Ok(Agent::new(config, registry, extractor, audit, pool))
}

fn print_json<T: serde::Serialize>(payload: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(payload)
        .map_err(|err| AppError::Io(format!("cannot render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
