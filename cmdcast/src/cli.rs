//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cmdcast - fleet command-dispatch agent
#[derive(Debug, Parser)]
#[command(
    name = "cmdcast",
    about = "Subscribes to a Redis channel and runs shell pipelines targeted at this node",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "CMDCAST_CONFIG", help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        env = "LOG_LEVEL",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub agent: AgentArgs,

    /// Subcommand to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Agent settings that override the config file
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AgentArgs {
    /// Redis address (host:port or redis:// URL)
    #[arg(long, global = true, env = "REDIS_ADDRESS")]
    pub redis_address: Option<String>,

    /// Channel to receive tasks on
    #[arg(long, global = true, env = "REDIS_CHANNEL")]
    pub redis_channel: Option<String>,

    /// Slack-compatible webhook for status notifications
    #[arg(long, global = true, env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: Option<String>,

    /// Node id (default: outbound interface address)
    #[arg(long, global = true, env = "SERVER_ID")]
    pub server_id: Option<String>,

    /// Node role, matched case-insensitively against task roles
    #[arg(long, global = true, env = "SERVER_ROLE")]
    pub server_role: Option<String>,

    /// Log notifications locally (true/false)
    #[arg(long, global = true, env = "LOGS")]
    pub logs: Option<bool>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the agent (default)
    Run,

    /// Print this node's resolved identity and notification prefix
    Identity,

    /// Load and validate configuration, then print it
    CheckConfig,
}
