//! cmdcast configuration types and loading
//!
//! Priority: CLI flags / environment > config file > defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bus::{DEFAULT_ADDRESS, DEFAULT_CHANNEL, ReconnectPolicy};
use crate::cli::AgentArgs;
use crate::domain::{DEFAULT_ROLE, NodeIdentity};
use crate::exec::DEFAULT_SHELL;

/// Address used to pick the outbound interface; nothing is sent to it
const OUTBOUND_PROBE_ADDR: &str = "8.8.8.8:80";

/// Main cmdcast configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Message bus connection
    pub bus: BusConfig,

    /// Status notifications
    pub notify: NotifyConfig,

    /// This node's identity
    pub node: NodeConfig,

    /// Instruction execution
    pub exec: ExecConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load; otherwise `./.cmdcast.yml`, then
    /// `~/.config/cmdcast/cmdcast.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".cmdcast.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("cmdcast").join("cmdcast.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Overlay values given on the command line or in the environment
    pub fn apply_args(&mut self, args: &AgentArgs) {
        if let Some(address) = &args.redis_address {
            self.bus.address = address.clone();
        }
        if let Some(channel) = &args.redis_channel {
            self.bus.channel = channel.clone();
        }
        if let Some(url) = &args.slack_webhook_url {
            // An explicitly empty URL disables delivery
            self.notify.webhook_url = Some(url.clone()).filter(|u| !u.is_empty());
        }
        if let Some(id) = &args.server_id {
            self.node.id = Some(id.clone()).filter(|i| !i.is_empty());
        }
        if let Some(role) = &args.server_role {
            self.node.role = role.clone();
        }
        if let Some(logs) = args.logs {
            self.notify.log_messages = logs;
        }
    }

    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.bus.address.trim().is_empty() {
            return Err(eyre::eyre!("bus.address must not be empty"));
        }
        if self.bus.channel.trim().is_empty() {
            return Err(eyre::eyre!("bus.channel must not be empty"));
        }
        if self.node.role.trim().is_empty() {
            return Err(eyre::eyre!("node.role must not be empty"));
        }
        let factor = self.bus.reconnect.factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(eyre::eyre!(
                "bus.reconnect.factor must be >= 1.0, got {}",
                factor
            ));
        }
        if let Some(url) = &self.notify.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(eyre::eyre!("notify.webhook-url must be an http(s) URL, got {}", url));
            }
        }
        Ok(())
    }

    /// Resolve the node identity, discovering the id if none is configured
    pub fn node_identity(&self) -> Result<NodeIdentity> {
        let id = match &self.node.id {
            Some(id) => id.clone(),
            None => discover_outbound_address()
                .context("Failed to determine node id from outbound address; set --server-id")?
                .to_string(),
        };
        Ok(NodeIdentity::new(id, self.node.role.clone()))
    }
}

/// Address of the interface used for outbound traffic
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn discover_outbound_address() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind probe socket")?;
    socket
        .connect(OUTBOUND_PROBE_ADDR)
        .context("Failed to route probe socket")?;
    let addr = socket.local_addr().context("Failed to read probe socket address")?;
    Ok(addr.ip())
}

/// Message bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Redis address (host:port or redis:// URL)
    pub address: String,

    /// Channel carrying task payloads
    pub channel: String,

    /// Per-attempt connection timeout in milliseconds
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Delay between failed reconnect attempts
    pub reconnect: ReconnectConfig,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            connect_timeout_ms: 5000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl BusConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Reconnect backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay after the first failed attempt in milliseconds
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Growth factor per failed attempt
    pub factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            factor: 2.0,
        }
    }
}

impl ReconnectConfig {
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial: Duration::from_millis(self.initial_delay_ms),
            max: Duration::from_millis(self.max_delay_ms),
            factor: self.factor,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Slack-compatible webhook URL; unset disables delivery
    #[serde(rename = "webhook-url", skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Log every notification locally
    #[serde(rename = "log-messages")]
    pub log_messages: bool,

    /// Delay before each delivery in milliseconds (inside the delivery task)
    #[serde(rename = "delivery-delay-ms")]
    pub delivery_delay_ms: u64,

    /// HTTP timeout for the webhook in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            log_messages: true,
            delivery_delay_ms: 1000,
            timeout_ms: 10_000,
        }
    }
}

impl NotifyConfig {
    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Node identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node id; unset means the outbound interface address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Node role
    pub role: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: None,
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// Instruction execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Shell invoked as `<shell> -c <command>`
    pub shell: String,

    /// Per-instruction timeout in milliseconds; unset means no timeout
    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            timeout_ms: None,
        }
    }
}

impl ExecConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
