//! Notification texts

use std::fmt;

/// A lifecycle event worth telling operators about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Initial subscription succeeded
    ConnectionEstablished { channel: String },

    /// The subscription broke while receiving
    ConnectionFailed,

    /// Subscription restored after a failure
    ConnectionReestablished { channel: String },

    TaskStarted { task: String },

    /// A stop-on-error instruction failed; remaining instructions were skipped
    TaskFailed { task: String, stderr: String },

    TaskFinished { task: String },
}

impl Notice {
    /// Short event name, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::ConnectionEstablished { .. } => "connection_established",
            Notice::ConnectionFailed => "connection_failed",
            Notice::ConnectionReestablished { .. } => "connection_reestablished",
            Notice::TaskStarted { .. } => "task_started",
            Notice::TaskFailed { .. } => "task_failed",
            Notice::TaskFinished { .. } => "task_finished",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ConnectionEstablished { channel } => {
                write!(f, "redis connection established! waiting for tasks in channel *{}*", channel)
            }
            Notice::ConnectionFailed => write!(f, "redis connection failed!"),
            Notice::ConnectionReestablished { channel } => {
                write!(f, "redis connection reestablished! waiting for tasks in channel *{}*", channel)
            }
            Notice::TaskStarted { task } => write!(f, "task *{}* started", task),
            Notice::TaskFailed { task, stderr } => write!(f, "task *{}* failed ```{}```", task, stderr),
            Notice::TaskFinished { task } => write!(f, "task *{}* finished", task),
        }
    }
}
