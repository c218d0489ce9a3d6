//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by a purchase channel.

use crate::domain::DeliveryError;
use async_trait::async_trait;
use shared_types::{Element, MessageUid, Timestamp};

/// Downstream consumer of purchase transactions.
///
/// Both methods are called after the transaction has been removed from the
/// open table; an `Err` is logged and never causes redelivery.
#[async_trait]
pub trait PurchaseTransactionHandler: Send + Sync {
    /// A terminal message closed the transaction.
    async fn handle_complete(
        &self,
        correlation_id: &str,
        document: Element,
    ) -> Result<(), DeliveryError>;

    /// The transaction went stale or was evicted before completing.
    async fn handle_partial(
        &self,
        correlation_id: &str,
        document: Element,
    ) -> Result<(), DeliveryError>;
}

/// Decides whether a message closes its purchase transaction.
pub trait TerminalDetector: Send + Sync {
    /// `message` is the message root element (e.g. `VERes`).
    fn closes_transaction(&self, uid: &MessageUid, message: &Element) -> bool;
}

/// Abstract interface for time (for testability).
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}
