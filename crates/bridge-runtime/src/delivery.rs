//! # Delivery
//!
//! Where a channel's transformed output goes. Per-message channels hand each
//! transformed message to a `MessageDelivery`; purchase channels hand whole
//! transactions to a `PurchaseTransactionHandler`.

use async_trait::async_trait;
use shared_types::{Element, ProtocolMessage};
use std::sync::Arc;
use tb_04_purchase_aggregator::{DeliveryError, PurchaseTransactionHandler};
use tracing::info;

/// Downstream consumer of a per-message channel.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    /// Deliver one transformed message. An `Err` is logged by the worker and
    /// the message is not retried.
    async fn deliver(&self, channel: &str, message: ProtocolMessage) -> Result<(), DeliveryError>;
}

/// Sinks a newly registered channel is wired to, chosen by channel kind.
#[derive(Clone)]
pub struct DeliveryTargets {
    pub messages: Arc<dyn MessageDelivery>,
    pub purchases: Arc<dyn PurchaseTransactionHandler>,
}

impl DeliveryTargets {
    pub fn new(
        messages: Arc<dyn MessageDelivery>,
        purchases: Arc<dyn PurchaseTransactionHandler>,
    ) -> Self {
        Self {
            messages,
            purchases,
        }
    }

    /// Both kinds of channel write to the log.
    pub fn logging() -> Self {
        Self::new(Arc::new(LoggingDelivery), Arc::new(LoggingDelivery))
    }
}

/// Writes every delivery to the log as a JSON event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDelivery;

impl LoggingDelivery {
    fn emit(&self, event_type: &str, payload: serde_json::Value) {
        info!(
            "DELIVERY_JSON {}",
            serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "event_type": event_type,
                "payload": payload,
            })
        );
    }

    fn transaction(&self, event_type: &str, correlation_id: &str, document: &Element) {
        self.emit(
            event_type,
            serde_json::json!({
                "correlation_id": correlation_id,
                "document": document,
            }),
        );
    }
}

#[async_trait]
impl MessageDelivery for LoggingDelivery {
    async fn deliver(&self, channel: &str, message: ProtocolMessage) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "channel": channel,
            "message": message,
        });
        self.emit("MessageDelivered", payload);
        Ok(())
    }
}

#[async_trait]
impl PurchaseTransactionHandler for LoggingDelivery {
    async fn handle_complete(
        &self,
        correlation_id: &str,
        document: Element,
    ) -> Result<(), DeliveryError> {
        self.transaction("PurchaseTransactionComplete", correlation_id, &document);
        Ok(())
    }

    async fn handle_partial(
        &self,
        correlation_id: &str,
        document: Element,
    ) -> Result<(), DeliveryError> {
        self.transaction("PurchaseTransactionPartial", correlation_id, &document);
        Ok(())
    }
}
