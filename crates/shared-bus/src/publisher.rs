//! # Message Publisher
//!
//! Defines the publishing side of the message bus.

use crate::selector::{Selector, SelectorError};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::ProtocolMessage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing protocol messages to the bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers the message was handed to (before
    /// selector evaluation).
    async fn publish(&self, message: ProtocolMessage) -> usize;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the message bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Selectors are evaluated on the subscriber side.
pub struct InMemoryMessageBus {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<ProtocolMessage>,

    /// Active subscription count by selector text.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryMessageBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe with a selector expression.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError` if the expression does not parse. No
    /// subscription is registered in that case.
    pub fn subscribe(&self, expression: &str) -> Result<Subscription, SelectorError> {
        let selector = Selector::parse(expression)?;
        let receiver = self.sender.subscribe();
        let expression = expression.to_string();

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(expression.clone()).or_insert(0) += 1;
        }

        debug!(selector = %expression, "New subscription created");

        Ok(Subscription::new(
            receiver,
            selector,
            expression,
            self.subscriptions.clone(),
        ))
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Selector expressions with at least one live subscription.
    #[must_use]
    pub fn active_selectors(&self) -> Vec<String> {
        self.subscriptions
            .read()
            .map(|subs| subs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, message: ProtocolMessage) -> usize {
        let uid = message.uid.clone();
        let merchant = message.merchant_id.clone();

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(
                    message = %uid,
                    merchant = %merchant,
                    receivers = receiver_count,
                    "Message published"
                );
                receiver_count
            }
            Err(e) => {
                warn!(
                    message = %uid,
                    merchant = %merchant,
                    error = %e,
                    "Message dropped (no receivers)"
                );
                0
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Element, MessageUid};

    fn message() -> ProtocolMessage {
        ProtocolMessage::new(
            "Merchant1",
            MessageUid::new("VEReq", "1.0.2"),
            None,
            0,
            Element::new("ThreeDSecure"),
        )
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = InMemoryMessageBus::new();

        let receivers = bus.publish(message()).await;
        assert_eq!(receivers, 0);
        assert_eq!(bus.messages_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_subscribers() {
        let bus = InMemoryMessageBus::new();

        let _sub1 = bus.subscribe("").unwrap();
        let _sub2 = bus.subscribe("MessageType = 'PARes'").unwrap();

        let receivers = bus.publish(message()).await;
        assert_eq!(receivers, 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_invalid_selector_not_registered() {
        let bus = InMemoryMessageBus::new();
        assert!(bus.subscribe("MessageType = ").is_err());
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.active_selectors().is_empty());
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryMessageBus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.messages_published(), 0);
    }
}
