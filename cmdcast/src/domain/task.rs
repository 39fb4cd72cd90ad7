//! Task payload as published on the bus

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Error returned when a bus payload is not a task
pub type TaskDecodeError = serde_json::Error;

/// One pipeline step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instruction {
    /// Shell command, passed verbatim to the runner
    #[serde(alias = "Command", deserialize_with = "null_as_default")]
    pub command: String,

    /// Skip the rest of the pipeline if this command fails
    #[serde(
        rename = "stop_pipeline_on_error",
        alias = "Stop_pipeline_on_error",
        alias = "STOP_PIPELINE_ON_ERROR",
        deserialize_with = "null_as_default"
    )]
    pub stop_on_error: bool,
}

impl Instruction {
    pub fn new(command: impl Into<String>, stop_on_error: bool) -> Self {
        Self {
            command: command.into(),
            stop_on_error,
        }
    }
}

/// A named, ordered list of instructions plus targeting constraints
///
/// Decoded once per bus message and consumed by a single pipeline run.
/// Empty target lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Human-readable name, only used in notifications
    #[serde(alias = "Name", alias = "NAME", deserialize_with = "null_as_default")]
    pub name: String,

    /// Instructions in execution order
    #[serde(alias = "Instructions", alias = "INSTRUCTIONS", deserialize_with = "null_as_default")]
    pub instructions: Vec<Instruction>,

    /// Node ids this task is restricted to
    #[serde(
        rename = "servers_ids",
        alias = "Servers_ids",
        alias = "SERVERS_IDS",
        deserialize_with = "null_as_default"
    )]
    pub target_server_ids: Vec<String>,

    /// Node roles this task is restricted to (case-insensitive)
    #[serde(
        rename = "servers_roles",
        alias = "Servers_roles",
        alias = "SERVERS_ROLES",
        deserialize_with = "null_as_default"
    )]
    pub target_server_roles: Vec<String>,
}

impl Task {
    /// Decode a raw bus payload
    ///
    /// The payload must be a JSON object. Unknown fields are ignored and
    /// missing (or `null`) fields take their empty defaults, inside
    /// instructions too. Keys match in lowercase, capitalized or uppercase
    /// form.
    pub fn decode(payload: &[u8]) -> Result<Self, TaskDecodeError> {
        debug!(len = payload.len(), "Task::decode: called");
        let task: Task = serde_json::from_slice(payload)?;
        debug!(name = %task.name, instructions = task.instructions.len(), "Task::decode: decoded");
        Ok(task)
    }

    /// Create an untargeted task
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
            ..Default::default()
        }
    }

    /// Restrict the task to the given node ids
    pub fn with_server_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_server_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the task to the given roles
    pub fn with_server_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_server_roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
