//! # Bridge Runtime Library
//!
//! Wiring for the bridge binary, exposed for integration tests.
//!
//! ## Modules
//!
//! - `config` - `BridgeConfig`, defaults and `TB_*` environment overrides
//! - `delivery` - `MessageDelivery` port and the logging sink
//! - `worker` - per-channel worker loop
//! - `runtime` - `BridgeRuntime`, channel table and sweep timer
//!
//! ## Message Flow
//!
//! ```text
//! transport ──selector match──→ ChannelWorker
//!                                   │ FieldTransformer::apply
//!                                   ↓
//!                   ┌───────────────┴───────────────┐
//!                   ↓                               ↓
//!          MessageDelivery::deliver        PurchaseChannel::on_message
//!                                                   │ terminal / sweep
//!                                                   ↓
//!                                    PurchaseTransactionHandler
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod delivery;
pub mod errors;
pub mod runtime;
pub mod worker;

pub use config::{BridgeConfig, ConfigError};
pub use delivery::{DeliveryTargets, LoggingDelivery, MessageDelivery};
pub use errors::RuntimeError;
pub use runtime::BridgeRuntime;
pub use worker::{ChannelSink, ChannelWorker};
