//! `sh -c` command runner

use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{CommandOutcome, CommandRunner};
use crate::error::ExecError;

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "sh";

/// Runs commands through `<shell> -c`, discarding stdout and capturing stderr
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    timeout: Option<Duration>,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL, None)
    }
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    async fn execute(&self, command: &str) -> Result<Output, ExecError> {
        let child = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => Ok(output?),
                Err(_) => Err(ExecError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            },
            None => Ok(child.wait_with_output().await?),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> CommandOutcome {
        debug!(%command, shell = %self.shell, "ShellRunner::run: called");
        match self.execute(command).await {
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                debug!(status = ?output.status, stderr_len = stderr.len(), "ShellRunner::run: command completed");
                CommandOutcome {
                    success: output.status.success(),
                    stderr,
                }
            }
            Err(e) => {
                debug!(error = %e, "ShellRunner::run: command did not complete");
                CommandOutcome::failure(e.to_string())
            }
        }
    }
}
