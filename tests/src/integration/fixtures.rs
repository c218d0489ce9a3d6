//! # Fixtures
//!
//! Protocol documents shaped like real 3-D Secure traffic and sinks that
//! forward everything they receive to a channel the test can await.

use async_trait::async_trait;
use bridge_runtime::{BridgeConfig, BridgeRuntime, DeliveryTargets, MessageDelivery};
use shared_bus::InMemoryMessageBus;
use shared_crypto::SecretKey;
use shared_types::{Element, MessageUid, ProtocolMessage};
use std::sync::Arc;
use std::time::Duration;
use tb_04_purchase_aggregator::{DeliveryError, PurchaseTransactionHandler};
use tokio::sync::mpsc;

/// How long a test waits for an expected delivery.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a test waits to be confident nothing is delivered.
pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Key every test runtime encrypts with.
pub fn test_key() -> SecretKey {
    SecretKey::from_bytes([0x42; 32])
}

// =============================================================================
// Sinks
// =============================================================================

/// One delivered message.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub channel: String,
    pub message: ProtocolMessage,
}

/// One flushed purchase transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Flushed {
    Complete(String, Element),
    Partial(String, Element),
}

pub struct CollectingDelivery {
    tx: mpsc::UnboundedSender<Delivered>,
}

#[async_trait]
impl MessageDelivery for CollectingDelivery {
    async fn deliver(&self, channel: &str, message: ProtocolMessage) -> Result<(), DeliveryError> {
        self.tx
            .send(Delivered {
                channel: channel.to_string(),
                message,
            })
            .map_err(|e| DeliveryError::Unavailable(e.to_string()))
    }
}

pub struct CollectingHandler {
    tx: mpsc::UnboundedSender<Flushed>,
}

#[async_trait]
impl PurchaseTransactionHandler for CollectingHandler {
    async fn handle_complete(&self, id: &str, document: Element) -> Result<(), DeliveryError> {
        self.tx
            .send(Flushed::Complete(id.to_string(), document))
            .map_err(|e| DeliveryError::Unavailable(e.to_string()))
    }

    async fn handle_partial(&self, id: &str, document: Element) -> Result<(), DeliveryError> {
        self.tx
            .send(Flushed::Partial(id.to_string(), document))
            .map_err(|e| DeliveryError::Unavailable(e.to_string()))
    }
}

/// Receiving ends of the collecting sinks.
pub struct Collected {
    pub messages: mpsc::UnboundedReceiver<Delivered>,
    pub transactions: mpsc::UnboundedReceiver<Flushed>,
}

/// Collecting sinks for both channel kinds.
pub fn collecting_targets() -> (DeliveryTargets, Collected) {
    let (message_tx, messages) = mpsc::unbounded_channel();
    let (transaction_tx, transactions) = mpsc::unbounded_channel();
    let targets = DeliveryTargets::new(
        Arc::new(CollectingDelivery { tx: message_tx }),
        Arc::new(CollectingHandler { tx: transaction_tx }),
    );
    (
        targets,
        Collected {
            messages,
            transactions,
        },
    )
}

/// Runtime over a fresh bus with a fixed key, EDT display zone and the
/// given aggregation limits.
pub fn runtime_with(max_age: Duration, sweep_interval: Duration) -> BridgeRuntime {
    let mut config = BridgeConfig::new();
    config.cipher_key = Some(test_key());
    config.mask.zone = "EDT-04:00".parse().unwrap_or_default();
    config.aggregator.max_age = max_age;
    config.aggregator.sweep_interval = sweep_interval;
    let bus = Arc::new(InMemoryMessageBus::with_capacity(64));
    match BridgeRuntime::new(config, bus) {
        Ok(runtime) => runtime,
        Err(e) => panic!("bundled schema must load: {e}"),
    }
}

/// Runtime with default aggregation limits.
pub fn runtime() -> BridgeRuntime {
    runtime_with(Duration::from_secs(86_400), Duration::from_secs(86_400))
}

// =============================================================================
// Documents
// =============================================================================

fn leaf(name: &str, text: &str) -> Element {
    Element::new(name).with_text(text)
}

fn envelope(root: Element) -> Element {
    Element::new("ThreeDSecure")
        .with_child(Element::new("Message").with_attribute("id", "msg-1").with_child(root))
}

fn message(
    merchant: &str,
    message_type: &str,
    version: &str,
    correlation_id: Option<&str>,
    root: Element,
) -> ProtocolMessage {
    ProtocolMessage::new(
        merchant,
        MessageUid::new(message_type, version),
        correlation_id.map(str::to_string),
        0,
        envelope(root),
    )
}

/// Enrollment request carrying a PAN and merchant password.
pub fn vereq(merchant: &str, version: &str, correlation_id: &str, pan: &str) -> ProtocolMessage {
    let root = Element::new("VEReq")
        .with_child(leaf("version", version))
        .with_child(leaf("pan", pan))
        .with_child(
            Element::new("Merchant")
                .with_child(leaf("acqBIN", "412345"))
                .with_child(leaf("merID", merchant))
                .with_child(leaf("password", "s3cret")),
        )
        .with_child(
            Element::new("Browser")
                .with_child(leaf("deviceCategory", "0"))
                .with_child(leaf("userAgent", "Mozilla/5.0")),
        );
    message(merchant, "VEReq", version, Some(correlation_id), root)
}

/// Enrollment result; `enrolled` is the `CH/enrolled` flag.
pub fn veres(merchant: &str, version: &str, correlation_id: &str, enrolled: &str) -> ProtocolMessage {
    let root = Element::new("VERes")
        .with_child(leaf("version", version))
        .with_child(
            Element::new("CH")
                .with_child(leaf("enrolled", enrolled))
                .with_child(leaf("acctID", "NDAxMjM0NTY3ODkwMTIzNA==")),
        )
        .with_child(leaf("url", "https://acs.example.com/pareq"))
        .with_child(leaf("protocol", "ThreeDSecure"));
    message(merchant, "VERes", version, Some(correlation_id), root)
}

/// Authentication request with purchase details.
pub fn pareq(merchant: &str, version: &str, correlation_id: &str) -> ProtocolMessage {
    let root = Element::new("PAReq")
        .with_child(leaf("version", version))
        .with_child(
            Element::new("Merchant")
                .with_child(leaf("acqBIN", "412345"))
                .with_child(leaf("merID", merchant))
                .with_child(leaf("name", "Example Store")),
        )
        .with_child(
            Element::new("Purchase")
                .with_child(leaf("xid", "MDAwMDAwMDAwMDAwMDAwMDAwMDE="))
                .with_child(leaf("date", "20020806 10:10:10"))
                .with_child(leaf("amount", "1234567.891"))
                .with_child(leaf("currency", "840")),
        )
        .with_child(
            Element::new("CH")
                .with_child(leaf("acctID", "NDAxMjM0NTY3ODkwMTIzNA=="))
                .with_child(leaf("expiry", "2912")),
        );
    message(merchant, "PAReq", version, Some(correlation_id), root)
}

/// Authentication result.
pub fn pares(merchant: &str, version: &str, correlation_id: &str) -> ProtocolMessage {
    let root = Element::new("PARes")
        .with_child(leaf("version", version))
        .with_child(
            Element::new("Merchant")
                .with_child(leaf("acqBIN", "412345"))
                .with_child(leaf("merID", merchant)),
        )
        .with_child(Element::new("Purchase").with_child(leaf("xid", "MDAwMDAwMDAwMDAwMDAwMDAwMDE=")))
        .with_child(leaf("pan", "0000000000000000"))
        .with_child(
            Element::new("TX")
                .with_child(leaf("status", "Y"))
                .with_child(leaf("cavv", "AAABAWFlmQAAAABjRWWZEEFgFz+=")),
        );
    message(merchant, "PARes", version, Some(correlation_id), root)
}

/// Any message without a correlation id.
pub fn without_correlation(mut message: ProtocolMessage) -> ProtocolMessage {
    message.correlation_id = None;
    message
}

/// Message root element of a delivered message.
pub fn root<'a>(message: &'a ProtocolMessage) -> Option<&'a Element> {
    message
        .document
        .first_child()
        .and_then(|body| body.child(&message.uid.message_type))
}
