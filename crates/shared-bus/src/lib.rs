//! # Shared Bus - Protocol Message Transport
//!
//! In-memory stand-in for the publish/subscribe transport the bridge is
//! deployed behind. Each channel subscribes with a selector expression; the
//! bus evaluates it against envelope headers and only hands over matching
//! messages.
//!
//! ```text
//! ┌────────────────┐  publish()   ┌──────────────┐  recv()   ┌───────────┐
//! │ Protocol engine│ ───────────→ │  Message Bus │ ────────→ │ Channel A │
//! └────────────────┘              │  [selectors] │ ────────→ │ Channel B │
//!                                 └──────────────┘           └───────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod selector;
pub mod subscriber;

// Re-export main types
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use selector::{Expr, Selector, SelectorError};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before lagging subscribers drop.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
