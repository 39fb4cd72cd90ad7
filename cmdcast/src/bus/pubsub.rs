//! Redis pub/sub connector

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::Msg;
use tracing::debug;

use super::{BusEvent, Connector, Subscription};
use crate::error::BusError;

/// Bus address used when none is configured
pub const DEFAULT_ADDRESS: &str = "redis://localhost:6379";

/// Channel used when none is configured
pub const DEFAULT_CHANNEL: &str = "cmds_tasks";

/// Accept bare `host:port` addresses by assuming `redis://`
pub fn normalize_address(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}

/// Subscribes to one Redis channel; each `connect` opens a new connection
pub struct RedisConnector {
    client: redis::Client,
    address: String,
    channel: String,
    connect_timeout: Duration,
}

impl RedisConnector {
    pub fn new(address: &str, channel: impl Into<String>, connect_timeout: Duration) -> Result<Self, BusError> {
        let address = normalize_address(address);
        debug!(%address, ?connect_timeout, "RedisConnector::new: called");
        let client = redis::Client::open(address.as_str()).map_err(|e| BusError::InvalidAddress {
            address: address.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            client,
            address,
            channel: channel.into(),
            connect_timeout,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn open(&self) -> Result<redis::aio::PubSub, BusError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|source| BusError::Connect {
                address: self.address.clone(),
                source,
            })?;

        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|source| BusError::Subscribe {
                channel: self.channel.clone(),
                source,
            })?;

        Ok(pubsub)
    }
}

#[async_trait]
impl Connector for RedisConnector {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn connect(&self) -> Result<Box<dyn Subscription>, BusError> {
        debug!(address = %self.address, channel = %self.channel, "RedisConnector::connect: called");
        let pubsub = tokio::time::timeout(self.connect_timeout, self.open())
            .await
            .map_err(|_| BusError::Timeout(self.connect_timeout))??;

        debug!(channel = %self.channel, "RedisConnector::connect: subscribed");
        Ok(Box::new(RedisSubscription {
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }
}

/// Message stream of one subscribed connection
///
/// The stream ends when the connection drops, which is reported as a
/// transport error.
struct RedisSubscription {
    messages: Pin<Box<dyn Stream<Item = Msg> + Send>>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_event(&mut self) -> BusEvent {
        match self.messages.next().await {
            Some(msg) => {
                debug!(channel = %msg.get_channel_name(), "RedisSubscription::next_event: message");
                BusEvent::Message(msg.get_payload_bytes().to_vec())
            }
            None => BusEvent::Error(BusError::ConnectionLost("message stream closed".to_string()).to_string()),
        }
    }
}
