//! Message bus
//!
//! The listener only needs "subscribe to a channel, then hand me payloads
//! until the transport breaks". [`Connector`] opens a fresh
//! [`Subscription`] per attempt; [`RedisConnector`] is the production
//! implementation over Redis pub/sub.

mod listener;
mod pubsub;
mod reconnect;

use async_trait::async_trait;

pub use listener::{BusListener, ListenerState, ListenerStep};
pub use pubsub::{DEFAULT_ADDRESS, DEFAULT_CHANNEL, RedisConnector, normalize_address};
pub use reconnect::ReconnectPolicy;

use crate::error::BusError;

/// One event received on a live subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// Raw payload published to the channel
    Message(Vec<u8>),

    /// The transport failed; the subscription is dead
    Error(String),
}

/// A live subscription to one channel
///
/// Never reused after it reports [`BusEvent::Error`].
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next event
    async fn next_event(&mut self) -> BusEvent;
}

/// Opens subscriptions to the configured channel
#[async_trait]
pub trait Connector: Send + Sync {
    /// Channel name, used in notifications
    fn channel(&self) -> &str;

    /// Open a connection and subscribe
    async fn connect(&self) -> Result<Box<dyn Subscription>, BusError>;
}
