//! # ThreeDS Bridge Test Suite
//!
//! End-to-end flows driven through the in-memory transport.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs        # Protocol documents and collecting sinks
//!     ├── channel_flows.rs   # Per-message channels: routing, transforms, reconfiguration
//!     └── purchase_flows.rs  # Purchase channels: aggregation and sweep
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tb-tests
//! cargo test -p tb-tests integration::purchase_flows
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod integration;
