//! Error types for cmdcast

use std::time::Duration;
use thiserror::Error;

/// Errors from the message bus transport
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Invalid bus address {address}: {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Failed to subscribe to channel {channel}: {source}")]
    Subscribe {
        channel: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

/// Errors from delivering a notification to the external sink
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Sink rejected notification with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors from running an instruction
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to execute command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
