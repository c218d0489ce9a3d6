//! # Purchase Transaction Aggregator (tb-04)
//!
//! Correlates the protocol messages of one purchase flow (enrollment check,
//! authentication request and result) into a single transaction document.
//!
//! ## Lifecycle
//!
//! ```text
//! OPEN --message--> OPEN
//! OPEN --terminal message--> FLUSHED (complete) --> removed
//! OPEN --idle past max age / table full--> FLUSHED (partial) --> removed
//! ```
//!
//! ## Crate Structure
//!
//! - `domain/` - `OpenTransaction`, `TransactionTable`, `AggregatorConfig`
//! - `ports/` - `PurchaseTransactionHandler`, `TerminalDetector`, `TimeSource`
//! - `adapters/` - schema-driven `TerminalDetector` for `SchemaRegistry`
//! - `service.rs` - `PurchaseChannel`, lock discipline and handler delivery
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Exactly-once flush | A transaction reaches its handler once, complete or partial |
//! | Remove first | Entries leave the table before the handler runs |
//! | Last write wins | A tag seen again replaces its earlier elements |
//! | Bounded table | At most `max_open_transactions` entries are open |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    AggregatorConfig, AggregatorError, DeliveryError, FlushReason, FlushedTransaction,
    OpenTransaction, TransactionTable, DEFAULT_MAX_AGE, DEFAULT_MAX_OPEN_TRANSACTIONS,
    DEFAULT_SWEEP_INTERVAL, TRANSACTION_ID_ATTRIBUTE, TRANSACTION_ROOT,
};
pub use ports::{PurchaseTransactionHandler, SystemTimeSource, TerminalDetector, TimeSource};
pub use service::{IngestOutcome, PurchaseChannel};
