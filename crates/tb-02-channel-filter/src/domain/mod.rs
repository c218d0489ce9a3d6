//! # Domain Layer
//!
//! Channel configuration model, its serialised form, validation and the
//! selector compiler.

pub mod config;
pub mod entities;
pub mod errors;
pub mod selector;

pub use entities::{ChannelConfig, ChannelKind, MessageFieldBean};
pub use errors::ChannelConfigError;
pub use selector::SelectorCompiler;
