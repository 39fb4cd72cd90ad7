//! Wiring: builds the listener and its collaborators from configuration

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::debug;

use crate::bus::{BusListener, RedisConnector};
use crate::config::Config;
use crate::domain::NodeIdentity;
use crate::exec::ShellRunner;
use crate::notify::{StatusNotifier, WebhookSink};
use crate::pipeline::PipelineExecutor;

/// Build the notifier, attaching the webhook sink when one is configured
pub fn build_notifier(config: &Config, identity: NodeIdentity) -> Result<StatusNotifier> {
    let notifier = StatusNotifier::new(identity, config.notify.log_messages)
        .with_delivery_delay(config.notify.delivery_delay());

    match &config.notify.webhook_url {
        Some(url) => {
            debug!("build_notifier: webhook sink enabled");
            let sink = WebhookSink::new(url.clone(), config.notify.timeout()).context("Failed to build webhook client")?;
            Ok(notifier.with_sink(Arc::new(sink)))
        }
        None => {
            debug!("build_notifier: no webhook configured, logging only");
            Ok(notifier)
        }
    }
}

/// Build a listener in the `Connecting` state
pub fn build_listener(config: &Config, identity: NodeIdentity) -> Result<BusListener> {
    let notifier = Arc::new(build_notifier(config, identity.clone())?);

    let connector = RedisConnector::new(&config.bus.address, config.bus.channel.clone(), config.bus.connect_timeout())
        .context("Invalid bus configuration")?;

    let runner = ShellRunner::new(config.exec.shell.clone(), config.exec.timeout());
    let executor = PipelineExecutor::new(identity, Arc::new(runner), notifier.clone());

    Ok(BusListener::new(
        Arc::new(connector),
        executor,
        notifier,
        config.bus.reconnect.policy(),
    ))
}
