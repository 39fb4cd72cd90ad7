//! Node-prefixed, best-effort status notifier

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Notice, NotificationSink, Notifier};
use crate::domain::NodeIdentity;

/// Formats notices with the node prefix, optionally logs them and queues
/// them for a detached delivery task that sends them to the sink in order
pub struct StatusNotifier {
    identity: NodeIdentity,
    log_messages: bool,
    sink: Option<Arc<dyn NotificationSink>>,
    delivery_delay: Duration,
    queue: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl StatusNotifier {
    /// Create a notifier with no sink (local logging only)
    pub fn new(identity: NodeIdentity, log_messages: bool) -> Self {
        Self {
            identity,
            log_messages,
            sink: None,
            delivery_delay: Duration::ZERO,
            queue: Mutex::new(None),
        }
    }

    /// Deliver notices to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Wait this long inside the delivery task before sending each notice
    pub fn with_delivery_delay(mut self, delay: Duration) -> Self {
        self.delivery_delay = delay;
        self
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Text as delivered to the sink
    pub fn format(&self, notice: &Notice) -> String {
        format!("{} {}", self.identity.prefix(), notice)
    }

    /// Sender into the delivery task, starting the task on `runtime` if none
    /// is running
    fn queue(&self, sink: &Arc<dyn NotificationSink>, runtime: &Handle) -> Option<mpsc::UnboundedSender<String>> {
        let mut queue = self.queue.lock().ok()?;
        if let Some(tx) = queue.as_ref() {
            if !tx.is_closed() {
                return Some(tx.clone());
            }
        }

        debug!("StatusNotifier::queue: starting delivery task");
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(deliver(Arc::clone(sink), rx, self.delivery_delay));
        *queue = Some(tx.clone());
        Some(tx)
    }
}

async fn deliver(sink: Arc<dyn NotificationSink>, mut rx: mpsc::UnboundedReceiver<String>, delay: Duration) {
    while let Some(text) = rx.recv().await {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = sink.send(&text).await {
            debug!(error = %e, "StatusNotifier: delivery failed, discarded");
        }
    }
}

impl Notifier for StatusNotifier {
    fn notify(&self, notice: Notice) {
        if self.log_messages {
            info!(kind = notice.kind(), "{}", notice);
        }

        let Some(sink) = &self.sink else {
            return;
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!(kind = notice.kind(), "StatusNotifier::notify: no async runtime, notification dropped");
            return;
        };

        let Some(queue) = self.queue(sink, &runtime) else {
            warn!(kind = notice.kind(), "StatusNotifier::notify: delivery queue unavailable, notification dropped");
            return;
        };
        let _ = queue.send(self.format(&notice));
    }
}
