//! cmdcast - fleet command-dispatch agent
//!
//! One agent runs on every machine in a fleet. It subscribes to a shared
//! Redis channel, decodes each message into a [`Task`], decides whether the
//! task targets this node, and runs the task's shell instructions in order
//! with fail-fast semantics. Lifecycle events are reported to a
//! Slack-compatible webhook on a best-effort basis.
//!
//! # Modules
//!
//! - [`domain`] - tasks, node identity, targeting
//! - [`exec`] - shell command runner
//! - [`notify`] - fire-and-forget status notifications
//! - [`pipeline`] - ordered, fail-fast instruction execution
//! - [`bus`] - subscription, reconnect state machine
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod agent;
pub mod bus;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exec;
pub mod notify;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use bus::{BusEvent, BusListener, Connector, ListenerState, ListenerStep, ReconnectPolicy, Subscription};
pub use config::Config;
pub use domain::{Instruction, NodeIdentity, Task, applies};
pub use error::{BusError, ExecError, NotifyError};
pub use exec::{CommandOutcome, CommandRunner, ShellRunner};
pub use notify::{Notice, NotificationSink, Notifier, StatusNotifier, WebhookSink};
pub use pipeline::{PipelineExecutor, PipelineOutcome};
