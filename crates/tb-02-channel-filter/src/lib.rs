//! # Channel Filter (tb-02)
//!
//! Per-channel subscription model and the selector compiler.
//!
//! A channel subscribes to a set of merchants and a set of (type, version)
//! messages, each with optional field overrides (keep / encrypt / mask). The
//! compiler turns that into the selector expression the transport routes
//! with; the service swaps configs atomically and decides when a changed
//! config needs a new subscription.
//!
//! ## Crate Structure
//!
//! - `domain/` - `ChannelConfig`, `MessageFieldBean`, validation, `SelectorCompiler`
//! - `ports/` - `TemplateValidator` (mask syntax is owned by the transform engine)
//! - `service.rs` - `ChannelFilterService`, live config and reconfiguration
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Content-only selectors | Insertion order never changes the selector |
//! | Quiet no-ops | Equal configs never resubscribe |
//! | Exclusive transforms | A field is either encrypted or masked |
//! | Fixed purchase channels | No field overrides, no reconfiguration |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{ChannelConfig, ChannelConfigError, ChannelKind, MessageFieldBean, SelectorCompiler};
pub use ports::TemplateValidator;
pub use service::{ChannelFilterService, Reconfiguration};
