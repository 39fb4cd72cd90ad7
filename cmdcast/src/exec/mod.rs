//! Instruction execution
//!
//! The pipeline only needs "run this command, tell me whether it worked and
//! what it wrote to stderr". [`ShellRunner`] is the production runner;
//! tests substitute their own [`CommandRunner`].

mod shell;

use async_trait::async_trait;

pub use shell::{DEFAULT_SHELL, ShellRunner};

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exited with status zero
    pub success: bool,

    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            stderr: String::new(),
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
        }
    }
}

/// Runs a shell command to completion
///
/// Implementations never return an error: a command that cannot be started
/// is reported as a failed outcome, same as a non-zero exit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> CommandOutcome;
}
