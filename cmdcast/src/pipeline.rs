//! Pipeline executor
//!
//! Runs a task's instructions strictly in order on this node. A failing
//! instruction flagged `stop_on_error` aborts the rest of the pipeline;
//! any other failure is ignored for control purposes.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{NodeIdentity, Task, applies};
use crate::exec::CommandRunner;
use crate::notify::{Notice, Notifier};

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Task does not target this node; nothing ran and nothing was reported
    NotApplicable,

    /// Every instruction ran (failures without stop-on-error included)
    Finished,

    /// Instruction at `index` failed with stop-on-error set
    Aborted { index: usize },
}

/// Executes tasks that target this node and reports their lifecycle
pub struct PipelineExecutor {
    identity: NodeIdentity,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
}

impl PipelineExecutor {
    pub fn new(identity: NodeIdentity, runner: Arc<dyn CommandRunner>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            identity,
            runner,
            notifier,
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Run `task` to completion
    ///
    /// Non-applicable tasks are ignored silently: no notification, no
    /// execution.
    pub async fn execute(&self, task: &Task) -> PipelineOutcome {
        if !applies(task, &self.identity) {
            debug!(task = %task.name, "PipelineExecutor::execute: task does not target this node");
            return PipelineOutcome::NotApplicable;
        }

        debug!(task = %task.name, instructions = task.instructions.len(), "PipelineExecutor::execute: starting");
        self.notifier.notify(Notice::TaskStarted {
            task: task.name.clone(),
        });

        for (index, instruction) in task.instructions.iter().enumerate() {
            let outcome = self.runner.run(&instruction.command).await;
            if outcome.success {
                debug!(index, "PipelineExecutor::execute: instruction succeeded");
                continue;
            }

            if instruction.stop_on_error {
                debug!(index, "PipelineExecutor::execute: instruction failed, stopping pipeline");
                self.notifier.notify(Notice::TaskFailed {
                    task: task.name.clone(),
                    stderr: outcome.stderr,
                });
                return PipelineOutcome::Aborted { index };
            }
            debug!(index, "PipelineExecutor::execute: instruction failed, continuing");
        }

        debug!(task = %task.name, "PipelineExecutor::execute: finished");
        self.notifier.notify(Notice::TaskFinished {
            task: task.name.clone(),
        });
        PipelineOutcome::Finished
    }
}
