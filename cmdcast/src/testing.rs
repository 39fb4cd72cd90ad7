//! Recording fakes shared by unit tests

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::exec::{CommandOutcome, CommandRunner};
use crate::notify::{Notice, Notifier};

/// Notifier that keeps every notice in order
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.notices.lock().unwrap().iter().map(Notice::kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Runner that records commands and fails the ones it was told to
#[derive(Default)]
pub struct ScriptedRunner {
    failing: HashSet<String>,
    ran: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` fail with `command` as its stderr
    pub fn failing(mut self, command: &str) -> Self {
        self.failing.insert(command.to_string());
        self
    }

    pub fn ran(&self) -> Vec<String> {
        self.ran.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str) -> CommandOutcome {
        self.ran.lock().unwrap().push(command.to_string());
        if self.failing.contains(command) {
            CommandOutcome::failure(format!("{}: failed", command))
        } else {
            CommandOutcome::success()
        }
    }
}
