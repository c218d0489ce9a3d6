//! # Purchase Channel
//!
//! Buffers the messages of one purchase channel into transactions and hands
//! each transaction to the channel's handler exactly once.
//!
//! ## Locking
//!
//! The transaction table sits behind one `parking_lot::Mutex`. Ingest and
//! sweep each take it once, decide and remove under it, and release it
//! before any handler runs. A transaction is therefore flushed by whichever
//! of the two gets the lock first, never by both, and a slow handler never
//! blocks ingests.

use crate::domain::{
    AggregatorConfig, AggregatorError, FlushReason, FlushedTransaction, TransactionTable,
};
use crate::ports::{PurchaseTransactionHandler, SystemTimeSource, TerminalDetector, TimeSource};
use parking_lot::Mutex;
use shared_types::{Element, ProtocolMessage, Timestamp};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What became of an ingested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Added to an open transaction.
    Buffered,
    /// Closed its transaction, which was handed to `handle_complete`.
    Completed,
    /// Refused (no correlation id or no body).
    Dropped,
}

pub struct PurchaseChannel {
    id: String,
    table: Mutex<TransactionTable>,
    detector: Arc<dyn TerminalDetector>,
    handler: Arc<dyn PurchaseTransactionHandler>,
    clock: Arc<dyn TimeSource>,
}

impl PurchaseChannel {
    /// Create a purchase channel using the system clock.
    ///
    /// # Errors
    ///
    /// Returns `AggregatorError::InvalidConfig` if `config` is unusable.
    pub fn new(
        id: impl Into<String>,
        config: AggregatorConfig,
        detector: Arc<dyn TerminalDetector>,
        handler: Arc<dyn PurchaseTransactionHandler>,
    ) -> Result<Self, AggregatorError> {
        config.validate()?;
        Ok(Self {
            id: id.into(),
            table: Mutex::new(TransactionTable::new(config)),
            detector,
            handler,
            clock: Arc::new(SystemTimeSource),
        })
    }

    /// Replace the clock used by `on_message` and `sweep`.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> AggregatorConfig {
        self.table.lock().config().clone()
    }

    /// Number of transactions currently open.
    pub fn open_transactions(&self) -> usize {
        self.table.lock().len()
    }

    /// Ingest a message at the current time. Structurally invalid messages
    /// are logged and dropped.
    pub async fn on_message(&self, message: &ProtocolMessage) -> IngestOutcome {
        match self.ingest_message(message, self.clock.now()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    channel = %self.id,
                    message_type = %message.uid.message_type,
                    error = %e,
                    "Dropping message from purchase aggregation"
                );
                IngestOutcome::Dropped
            }
        }
    }

    /// Ingest a message at `now`.
    ///
    /// The correlation id comes from the envelope header. The body is the
    /// element directly under the document root (`Message`), and the
    /// message root is its child named after the message type.
    ///
    /// # Errors
    ///
    /// Returns `AggregatorError::MissingCorrelationId` for a missing or blank
    /// correlation id and `AggregatorError::MissingBody` when the body or
    /// message root element is absent.
    pub async fn ingest_message(
        &self,
        message: &ProtocolMessage,
        now: Timestamp,
    ) -> Result<IngestOutcome, AggregatorError> {
        let message_type = &message.uid.message_type;
        let correlation_id = message
            .correlation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AggregatorError::MissingCorrelationId {
                message_type: message_type.clone(),
            })?;

        let (body, root) = locate(&message.document, message_type).ok_or_else(|| {
            AggregatorError::MissingBody {
                correlation_id: correlation_id.to_string(),
                message_type: message_type.clone(),
            }
        })?;

        let terminal = self.detector.closes_transaction(&message.uid, root);
        Ok(self.ingest(correlation_id, body, terminal, now).await)
    }

    /// Merge `body` into its transaction and deliver whatever the merge
    /// flushed.
    pub async fn ingest(
        &self,
        correlation_id: &str,
        body: &Element,
        terminal: bool,
        now: Timestamp,
    ) -> IngestOutcome {
        let flushed = self.table.lock().ingest(correlation_id, body, terminal, now);
        debug!(
            channel = %self.id,
            correlation_id,
            terminal,
            flushed = flushed.len(),
            "Ingested purchase message"
        );

        let completed = flushed
            .first()
            .is_some_and(|tx| tx.is_complete() && tx.correlation_id == correlation_id);
        self.deliver(flushed).await;

        if completed {
            IngestOutcome::Completed
        } else {
            IngestOutcome::Buffered
        }
    }

    /// Flush stale transactions at the current time.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now()).await
    }

    /// Flush transactions idle past the maximum age at `now`. Returns the
    /// number flushed.
    pub async fn sweep_at(&self, now: Timestamp) -> usize {
        let flushed = self.table.lock().sweep(now);
        let count = flushed.len();
        if count > 0 {
            info!(channel = %self.id, count, "Sweeping stale purchase transactions");
        }
        self.deliver(flushed).await;
        count
    }

    async fn deliver(&self, flushed: Vec<FlushedTransaction>) {
        for transaction in flushed {
            let FlushedTransaction {
                correlation_id,
                reason,
                document,
            } = transaction;

            let result = match reason {
                FlushReason::Terminal => {
                    info!(channel = %self.id, correlation_id = %correlation_id, "Purchase transaction complete");
                    self.handler.handle_complete(&correlation_id, document).await
                }
                FlushReason::Expired | FlushReason::Evicted => {
                    warn!(
                        channel = %self.id,
                        correlation_id = %correlation_id,
                        reason = ?reason,
                        "Flushing partial purchase transaction"
                    );
                    self.handler.handle_partial(&correlation_id, document).await
                }
            };

            if let Err(e) = result {
                error!(
                    channel = %self.id,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Purchase transaction handler failed"
                );
            }
        }
    }
}

/// `(body, message root)` of a protocol document.
fn locate<'a>(document: &'a Element, message_type: &str) -> Option<(&'a Element, &'a Element)> {
    let body = document.first_child()?;
    let root = body.child(message_type)?;
    Some((body, root))
}
