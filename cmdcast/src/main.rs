//! cmdcast - fleet command-dispatch agent
//!
//! CLI entry point: loads configuration and runs the agent until killed.

use std::io::IsTerminal;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use cmdcast::agent::build_listener;
use cmdcast::cli::{Cli, Command};
use cmdcast::config::Config;

fn parse_level(s: &str) -> Option<tracing::Level> {
    match s.to_uppercase().as_str() {
        "TRACE" => Some(tracing::Level::TRACE),
        "DEBUG" => Some(tracing::Level::DEBUG),
        "INFO" => Some(tracing::Level::INFO),
        "WARN" | "WARNING" => Some(tracing::Level::WARN),
        "ERROR" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => parse_level(s).unwrap_or_else(|| {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }),
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install log subscriber: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.apply_args(&cli.agent);
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Run) => cmd_run(&config).await,
        Some(Command::Identity) => cmd_identity(&config),
        Some(Command::CheckConfig) => cmd_check_config(&config),
    }
}

/// Run the agent until killed
async fn cmd_run(config: &Config) -> Result<()> {
    let identity = config.node_identity()?;
    info!(
        server_id = %identity.server_id(),
        server_role = %identity.server_role(),
        address = %config.bus.address,
        channel = %config.bus.channel,
        "cmdcast starting"
    );

    let mut listener = build_listener(config, identity)?;
    listener
        .connect_initial()
        .await
        .context(format!("Failed to subscribe to {} on {}", config.bus.channel, config.bus.address))?;

    tokio::select! {
        result = listener.run() => match result {
            Ok(never) => match never {},
            Err(e) => Err(e).context("Bus listener stopped"),
        },
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting");
            Ok(())
        }
    }
}

/// Print the resolved identity
fn cmd_identity(config: &Config) -> Result<()> {
    let identity = config.node_identity()?;
    println!("server_id:   {}", identity.server_id());
    println!("server_role: {}", identity.server_role());
    println!("prefix:      {}", identity.prefix());
    Ok(())
}

/// Print the effective configuration
fn cmd_check_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                debug!(error = %e, "shutdown_signal: SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
