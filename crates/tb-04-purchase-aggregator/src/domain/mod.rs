//! # Domain Layer
//!
//! Open-transaction accumulation and the table that flushes it.

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod transaction;

pub use aggregator::TransactionTable;
pub use config::{
    AggregatorConfig, DEFAULT_MAX_AGE, DEFAULT_MAX_OPEN_TRANSACTIONS, DEFAULT_SWEEP_INTERVAL,
};
pub use errors::{AggregatorError, DeliveryError};
pub use transaction::{
    FlushReason, FlushedTransaction, OpenTransaction, TRANSACTION_ID_ATTRIBUTE, TRANSACTION_ROOT,
};
