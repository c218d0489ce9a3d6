//! # Shared Types Crate
//!
//! Types shared by every bridge subsystem.
//!
//! ## Contents
//!
//! - **Entities**: `MessageUid` (message type + protocol version), `Timestamp`
//! - **Document**: the `Element` tree protocol messages are carried in, and
//!   `ElementPath` expressions addressing fields inside it
//! - **Envelope**: `ProtocolMessage`, the transport envelope whose header
//!   properties channel selectors are evaluated against
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: a message's identity lives in the envelope
//!   header, never re-derived from the document by consumers.
//! - **Read-mostly**: documents are cloned per channel before mutation, so a
//!   transform applied for one channel never leaks into another.

pub mod document;
pub mod entities;
pub mod envelope;
pub mod errors;

pub use document::{Attribute, Element, ElementPath};
pub use entities::*;
pub use envelope::{headers, ProtocolMessage};
pub use errors::*;
