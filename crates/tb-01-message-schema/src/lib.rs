//! # Message Schema Registry (tb-01)
//!
//! Versioned definitions of the protocol's message types. For every
//! (type, version) the registry records where the message root sits inside a
//! document, which fields it declares, which of them are mandatory, which
//! must be encrypted, and whether the message closes a purchase transaction.
//!
//! ## Lifecycle
//!
//! ```text
//! schema JSON ──SchemaSource::from_json──→ SchemaSource
//!                                              │ SchemaRegistry::from_source
//!                                              ↓
//!                              Arc<SchemaRegistry> (read-only, shared)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Unique identity | One definition per (type, version) |
//! | Concrete versions | The `""` wildcard never appears in a schema |
//! | Anchored roots | Message roots are absolute paths |
//! | Miss is benign | Unknown messages pass through unfiltered |
//!
//! ## Usage
//!
//! ```ignore
//! use tb_01_message_schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::three_d_secure()?;
//! let versions = registry.known_versions("PARes");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod source;

pub use domain::entities::{FieldDefinition, MessageDefinition, TerminalPolicy};
pub use domain::errors::SchemaError;
pub use domain::registry::SchemaRegistry;
pub use source::{MessageEntry, SchemaSource, THREE_D_SECURE_SCHEMA};
