//! Status notifications
//!
//! Notifications are fire-and-forget: [`Notifier::notify`] returns
//! immediately and delivery happens on a detached task, so a slow or
//! unreachable sink never stalls task execution or message consumption.
//!
//! - [`Notice`] - the fixed set of status messages
//! - [`Notifier`] - "submit, don't await" interface used by the core
//! - [`StatusNotifier`] - prefixes, logs and dispatches to a [`NotificationSink`]
//! - [`WebhookSink`] - Slack-compatible incoming webhook

mod notice;
mod sink;
mod status;

pub use notice::Notice;
pub use sink::{NotificationSink, WebhookSink};
pub use status::StatusNotifier;

/// Submit a status notice without waiting for delivery
///
/// Implementations must not block for longer than a small bounded delay and
/// must never panic; delivery failures are swallowed.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
