//! # Channel Workers
//!
//! One task per channel consumes the channel's subscription, runs the field
//! transforms and hands the result to the channel's sink. A message that
//! fails anywhere is logged and dropped; the loop only ends on shutdown or
//! when the transport closes.
//!
//! ## Rebinding
//!
//! A rebind subscribes with the channel's current selector first, then
//! drains whatever is still queued on the old subscription before dropping
//! it. Messages published between the two steps sit on both receivers, so
//! the ids handled during the drain are skipped when they show up again on
//! the new one.

use crate::delivery::MessageDelivery;
use shared_bus::{InMemoryMessageBus, Subscription, SubscriptionError};
use shared_types::ProtocolMessage;
use std::collections::HashSet;
use std::sync::Arc;
use tb_02_channel_filter::ChannelFilterService;
use tb_03_field_transform::FieldTransformer;
use tb_04_purchase_aggregator::PurchaseChannel;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Where a channel's transformed messages go.
#[derive(Clone)]
pub enum ChannelSink {
    /// Each message is delivered on its own.
    Messages(Arc<dyn MessageDelivery>),
    /// Messages are aggregated into purchase transactions.
    Purchase(Arc<PurchaseChannel>),
}

pub struct ChannelWorker {
    bus: Arc<InMemoryMessageBus>,
    filter: Arc<ChannelFilterService>,
    transformer: Arc<FieldTransformer>,
    sink: ChannelSink,
}

impl ChannelWorker {
    pub fn new(
        bus: Arc<InMemoryMessageBus>,
        filter: Arc<ChannelFilterService>,
        transformer: Arc<FieldTransformer>,
        sink: ChannelSink,
    ) -> Self {
        Self {
            bus,
            filter,
            transformer,
            sink,
        }
    }

    /// Transform one message with the config in force and hand it on.
    pub async fn handle(&self, mut message: ProtocolMessage) {
        let config = self.filter.current();
        let channel = config.id();
        let fields = config.fields_for(&message.uid);

        let report = self
            .transformer
            .apply(&message.uid, fields, &mut message.document);
        for failure in report.failures() {
            warn!(
                channel,
                message_type = %message.uid.message_type,
                path = %failure.path,
                operation = %failure.operation,
                error = %failure.error,
                "Field transform failed"
            );
        }
        debug!(
            channel,
            message_type = %message.uid.message_type,
            version = %message.uid.version,
            transformed = report.transformed,
            "Message transformed"
        );

        match &self.sink {
            ChannelSink::Messages(delivery) => {
                if let Err(e) = delivery.deliver(channel, message).await {
                    error!(channel, error = %e, "Message delivery failed");
                }
            }
            ChannelSink::Purchase(purchase) => {
                purchase.on_message(&message).await;
            }
        }
    }

    /// Consume `subscription` until shutdown. Each request on `rebind`
    /// moves the worker to the channel's current selector and is answered
    /// once the old subscription is drained.
    pub async fn run(
        self,
        mut subscription: Subscription,
        mut rebind: mpsc::Receiver<oneshot::Sender<()>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let channel = self.filter.id();
        info!(channel = %channel, selector = %subscription.expression(), "Channel worker started");

        let mut drained: HashSet<Uuid> = HashSet::new();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(channel = %channel, "Shutdown signal received");
                    break;
                }
                Some(done) = rebind.recv() => {
                    let selector = self.filter.selector();
                    match self.bus.subscribe(&selector) {
                        Ok(next) => {
                            drained = self.drain(&mut subscription).await;
                            subscription = next;
                            info!(
                                channel = %channel,
                                selector = %selector,
                                drained = drained.len(),
                                "Channel resubscribed"
                            );
                        }
                        Err(e) => {
                            error!(
                                channel = %channel,
                                error = %e,
                                "Resubscription failed, keeping previous selector"
                            );
                        }
                    }
                    let _ = done.send(());
                }
                received = subscription.recv() => match received {
                    Some(message) if drained.remove(&message.id) => {
                        debug!(
                            channel = %channel,
                            id = %message.id,
                            "Skipping message handled before rebind"
                        );
                    }
                    Some(message) => self.handle(message).await,
                    None => {
                        warn!(channel = %channel, "Transport closed, stopping channel worker");
                        break;
                    }
                },
            }
        }
    }

    /// Handle every message still queued on `subscription`. Returns their ids.
    async fn drain(&self, subscription: &mut Subscription) -> HashSet<Uuid> {
        let mut handled = HashSet::new();
        loop {
            match subscription.try_recv() {
                Ok(Some(message)) => {
                    handled.insert(message.id);
                    self.handle(message).await;
                }
                Ok(None) | Err(SubscriptionError::Closed) => return handled,
            }
        }
    }
}
