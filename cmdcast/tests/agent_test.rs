//! Integration tests for cmdcast
//!
//! Drive the listener end-to-end with a scripted bus and the real shell runner.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use cmdcast::{
    BusError, BusEvent, BusListener, Connector, ListenerState, ListenerStep, NodeIdentity, Notice, Notifier,
    PipelineExecutor, PipelineOutcome, ReconnectPolicy, ShellRunner, Subscription,
};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
struct Recorder {
    notices: Mutex<Vec<Notice>>,
}

impl Recorder {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

struct QueueSubscription {
    events: VecDeque<BusEvent>,
}

#[async_trait]
impl Subscription for QueueSubscription {
    async fn next_event(&mut self) -> BusEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

/// Fails `failures` reconnects after the first subscription breaks
struct FlakyConnector {
    attempts: AtomicUsize,
    failures: usize,
    first: Mutex<Option<Vec<BusEvent>>>,
    after_recovery: Mutex<Option<Vec<BusEvent>>>,
}

#[async_trait]
impl Connector for FlakyConnector {
    fn channel(&self) -> &str {
        "cmds_tasks"
    }

    async fn connect(&self) -> Result<Box<dyn Subscription>, BusError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            let events = self.first.lock().unwrap().take().unwrap_or_default();
            return Ok(Box::new(QueueSubscription { events: events.into() }));
        }
        if attempt <= self.failures {
            return Err(BusError::ConnectionLost("connection refused".to_string()));
        }
        let events = self.after_recovery.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(QueueSubscription { events: events.into() }))
    }
}

fn task_event(json: String) -> BusEvent {
    BusEvent::Message(json.into_bytes())
}

fn listener(connector: Arc<FlakyConnector>, recorder: Arc<Recorder>, identity: NodeIdentity) -> BusListener {
    let executor = PipelineExecutor::new(identity, Arc::new(ShellRunner::default()), recorder.clone());
    BusListener::new(connector, executor, recorder, ReconnectPolicy::immediate())
}

// =============================================================================
// Pipeline over a real shell
// =============================================================================

#[tokio::test]
async fn test_fail_fast_pipeline_over_shell() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("third-ran");
    let payload = serde_json::json!({
        "name": "deploy",
        "instructions": [
            {"command": "true", "stop_pipeline_on_error": true},
            {"command": "echo disk full >&2; exit 1", "stop_pipeline_on_error": true},
            {"command": format!("touch {}", marker.display()), "stop_pipeline_on_error": false},
        ],
    });

    let connector = Arc::new(FlakyConnector {
        attempts: AtomicUsize::new(0),
        failures: 0,
        first: Mutex::new(Some(vec![task_event(payload.to_string())])),
        after_recovery: Mutex::new(None),
    });
    let recorder = Arc::new(Recorder::default());
    let mut listener = listener(connector, recorder.clone(), NodeIdentity::new("10.0.0.5", "app"));

    listener.connect_initial().await.unwrap();
    let step = listener.step().await.unwrap();

    assert_eq!(step, ListenerStep::Dispatched(PipelineOutcome::Aborted { index: 1 }));
    assert!(!marker.exists(), "instruction after a stop-on-error failure must not run");
    assert_eq!(
        recorder.notices(),
        vec![
            Notice::ConnectionEstablished {
                channel: "cmds_tasks".to_string()
            },
            Notice::TaskStarted {
                task: "deploy".to_string()
            },
            Notice::TaskFailed {
                task: "deploy".to_string(),
                stderr: "disk full\n".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_ignored_failure_then_success_over_shell() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("second-ran");
    let payload = serde_json::json!({
        "name": "tidy",
        "instructions": [
            {"command": "exit 7", "stop_pipeline_on_error": false},
            {"command": format!("touch {}", marker.display()), "stop_pipeline_on_error": true},
        ],
    });

    let connector = Arc::new(FlakyConnector {
        attempts: AtomicUsize::new(0),
        failures: 0,
        first: Mutex::new(Some(vec![task_event(payload.to_string())])),
        after_recovery: Mutex::new(None),
    });
    let recorder = Arc::new(Recorder::default());
    let mut listener = listener(connector, recorder.clone(), NodeIdentity::new("10.0.0.5", "app"));

    listener.connect_initial().await.unwrap();
    let step = listener.step().await.unwrap();

    assert_eq!(step, ListenerStep::Dispatched(PipelineOutcome::Finished));
    assert!(marker.exists());
    assert_eq!(
        recorder.notices().last(),
        Some(&Notice::TaskFinished {
            task: "tidy".to_string()
        })
    );
}

#[tokio::test]
async fn test_task_for_other_role_does_nothing() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("ran");
    let payload = serde_json::json!({
        "name": "db-maintenance",
        "instructions": [{"command": format!("touch {}", marker.display())}],
        "servers_roles": ["DB"],
    });

    let connector = Arc::new(FlakyConnector {
        attempts: AtomicUsize::new(0),
        failures: 0,
        first: Mutex::new(Some(vec![task_event(payload.to_string())])),
        after_recovery: Mutex::new(None),
    });
    let recorder = Arc::new(Recorder::default());
    let mut listener = listener(connector, recorder.clone(), NodeIdentity::new("10.0.0.5", "web"));

    listener.connect_initial().await.unwrap();
    let step = listener.step().await.unwrap();

    assert_eq!(step, ListenerStep::Dispatched(PipelineOutcome::NotApplicable));
    assert!(!marker.exists());
    assert_eq!(recorder.notices().len(), 1);
}

// =============================================================================
// Recovery
// =============================================================================

#[tokio::test]
async fn test_recovers_and_resumes_dispatch() {
    let connector = Arc::new(FlakyConnector {
        attempts: AtomicUsize::new(0),
        failures: 4,
        first: Mutex::new(Some(vec![
            task_event(r#"{"name": "one"}"#.to_string()),
            BusEvent::Error("broken pipe".to_string()),
        ])),
        after_recovery: Mutex::new(Some(vec![
            BusEvent::Message(b"\x00garbage".to_vec()),
            task_event(r#"{"name": "two"}"#.to_string()),
        ])),
    });
    let recorder = Arc::new(Recorder::default());
    let mut listener = listener(connector.clone(), recorder.clone(), NodeIdentity::new("n", "app"));

    listener.connect_initial().await.unwrap();

    let mut steps = Vec::new();
    let drive = async {
        while steps.len() < 9 {
            steps.push(listener.step().await.unwrap());
        }
    };
    tokio::time::timeout(Duration::from_secs(5), drive).await.unwrap();

    assert_eq!(
        steps,
        vec![
            ListenerStep::Dispatched(PipelineOutcome::Finished),
            ListenerStep::ConnectionLost,
            ListenerStep::ReconnectFailed { failures: 1 },
            ListenerStep::ReconnectFailed { failures: 2 },
            ListenerStep::ReconnectFailed { failures: 3 },
            ListenerStep::ReconnectFailed { failures: 4 },
            ListenerStep::Reconnected,
            ListenerStep::Dropped,
            ListenerStep::Dispatched(PipelineOutcome::Finished),
        ]
    );
    assert_eq!(listener.state(), ListenerState::Subscribed);
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 6);

    let kinds: Vec<&str> = recorder.notices().iter().map(Notice::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "connection_established",
            "task_started",
            "task_finished",
            "connection_failed",
            "connection_reestablished",
            "task_started",
            "task_finished",
        ]
    );
}

#[tokio::test]
async fn test_run_keeps_going_until_cancelled() {
    let connector = Arc::new(FlakyConnector {
        attempts: AtomicUsize::new(0),
        failures: 2,
        first: Mutex::new(Some(vec![BusEvent::Error("eof".to_string())])),
        after_recovery: Mutex::new(Some(vec![])),
    });
    let recorder = Arc::new(Recorder::default());
    let listener = listener(connector.clone(), recorder.clone(), NodeIdentity::new("n", "app"));

    // Subscribed with an empty queue, run() parks forever
    let result = tokio::time::timeout(Duration::from_millis(300), listener.run()).await;

    assert!(result.is_err(), "run() must not return after a successful initial connect");
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 4);
    assert_eq!(
        recorder.notices().last(),
        Some(&Notice::ConnectionReestablished {
            channel: "cmds_tasks".to_string()
        })
    );
}
