//! # Domain Layer
//!
//! Schema entities, the registry that indexes them, and load errors.

pub mod entities;
pub mod errors;
pub mod registry;

pub use entities::{FieldDefinition, MessageDefinition, TerminalPolicy};
pub use errors::SchemaError;
pub use registry::SchemaRegistry;
