//! # Ports Layer
//!
//! - `PurchaseTransactionHandler`: receives complete and partial transactions
//! - `TerminalDetector`: decides whether a message closes its transaction
//! - `TimeSource`: wall clock for ingest and sweep timestamps

pub mod outbound;

pub use outbound::{PurchaseTransactionHandler, SystemTimeSource, TerminalDetector, TimeSource};
