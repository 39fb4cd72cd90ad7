//! Bus listener state machine
//!
//! ```text
//! Connecting --ok--> Subscribed --transport error--> Recovering
//!     |                  ^                               |
//!   fatal                +------------ok-----------------+ (retry forever)
//! ```
//!
//! Tasks are executed synchronously inside the receive loop, so at most one
//! task runs per node and the loop itself is the serialization point.
//! Messages published while no subscription is active are lost; pub/sub
//! keeps no backlog.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{BusEvent, Connector, ReconnectPolicy, Subscription};
use crate::domain::Task;
use crate::error::BusError;
use crate::notify::{Notice, Notifier};
use crate::pipeline::{PipelineExecutor, PipelineOutcome};

/// Observable listener state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Connecting,
    Subscribed,
    Recovering,
}

/// What a single [`BusListener::step`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerStep {
    /// Initial subscription established
    Connected,

    /// A task was decoded and handed to the pipeline
    Dispatched(PipelineOutcome),

    /// Payload was not a task and was discarded
    Dropped,

    /// The subscription failed; now recovering
    ConnectionLost,

    /// A reconnect attempt failed (`failures` so far)
    ReconnectFailed { failures: u32 },

    /// Subscription restored
    Reconnected,
}

enum Stage {
    Connecting,
    Subscribed(Box<dyn Subscription>),
    Recovering { failures: u32 },
}

/// Owns the subscription and drives tasks through the pipeline
pub struct BusListener {
    connector: Arc<dyn Connector>,
    executor: PipelineExecutor,
    notifier: Arc<dyn Notifier>,
    policy: ReconnectPolicy,
    stage: Stage,
}

impl BusListener {
    pub fn new(
        connector: Arc<dyn Connector>,
        executor: PipelineExecutor,
        notifier: Arc<dyn Notifier>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            connector,
            executor,
            notifier,
            policy,
            stage: Stage::Connecting,
        }
    }

    pub fn state(&self) -> ListenerState {
        match self.stage {
            Stage::Connecting => ListenerState::Connecting,
            Stage::Subscribed(_) => ListenerState::Subscribed,
            Stage::Recovering { .. } => ListenerState::Recovering,
        }
    }

    /// Open the first subscription
    ///
    /// Failure here is fatal: the agent cannot do anything useful without
    /// an initial connection.
    pub async fn connect_initial(&mut self) -> Result<(), BusError> {
        debug!(channel = %self.connector.channel(), "BusListener::connect_initial: called");
        let subscription = self.connector.connect().await?;
        self.stage = Stage::Subscribed(subscription);
        info!(channel = %self.connector.channel(), "Subscribed to bus channel");
        self.notifier.notify(Notice::ConnectionEstablished {
            channel: self.connector.channel().to_string(),
        });
        Ok(())
    }

    /// Perform one state transition
    ///
    /// Only an initial connection failure returns `Err`.
    pub async fn step(&mut self) -> Result<ListenerStep, BusError> {
        match &mut self.stage {
            Stage::Connecting => {
                self.connect_initial().await?;
                Ok(ListenerStep::Connected)
            }
            Stage::Subscribed(subscription) => {
                let event = subscription.next_event().await;
                Ok(self.handle_event(event).await)
            }
            Stage::Recovering { failures } => {
                let failures = *failures;
                Ok(self.reconnect(failures).await)
            }
        }
    }

    /// Run until the process is killed
    ///
    /// Returns only if the initial connection fails.
    pub async fn run(mut self) -> Result<Infallible, BusError> {
        loop {
            self.step().await?;
        }
    }

    async fn handle_event(&mut self, event: BusEvent) -> ListenerStep {
        match event {
            BusEvent::Message(payload) => match Task::decode(&payload) {
                Ok(task) => {
                    debug!(task = %task.name, "BusListener::handle_event: dispatching task");
                    let outcome = self.executor.execute(&task).await;
                    debug!(task = %task.name, ?outcome, "BusListener::handle_event: task done");
                    ListenerStep::Dispatched(outcome)
                }
                Err(e) => {
                    debug!(error = %e, len = payload.len(), "BusListener::handle_event: dropping malformed payload");
                    ListenerStep::Dropped
                }
            },
            BusEvent::Error(reason) => {
                warn!(%reason, "Bus connection failed, recovering");
                self.notifier.notify(Notice::ConnectionFailed);
                self.stage = Stage::Recovering { failures: 0 };
                ListenerStep::ConnectionLost
            }
        }
    }

    async fn reconnect(&mut self, failures: u32) -> ListenerStep {
        if failures > 0 {
            let delay = self.policy.delay(failures - 1);
            if !delay.is_zero() {
                debug!(?delay, failures, "BusListener::reconnect: waiting before retry");
                tokio::time::sleep(delay).await;
            }
        }

        match self.connector.connect().await {
            Ok(subscription) => {
                info!(channel = %self.connector.channel(), failures, "Bus connection reestablished");
                self.stage = Stage::Subscribed(subscription);
                self.notifier.notify(Notice::ConnectionReestablished {
                    channel: self.connector.channel().to_string(),
                });
                ListenerStep::Reconnected
            }
            Err(e) => {
                let failures = failures.saturating_add(1);
                warn!(error = %e, failures, "Reconnect attempt failed");
                self.stage = Stage::Recovering { failures };
                ListenerStep::ReconnectFailed { failures }
            }
        }
    }
}
