//! # Domain Errors
//!
//! Errors raised while loading or validating a message schema.

use shared_types::{MessageUid, PathError};
use thiserror::Error;

/// Errors raised by the schema registry.
///
/// Lookups never fail: a message without a definition is passed through
/// unfiltered, so every variant here is a load-time failure.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two definitions share the same (type, version).
    #[error("Duplicate schema definition for {0}")]
    DuplicateDefinition(MessageUid),

    /// A definition has an empty message type name.
    #[error("Schema definition with empty message type")]
    EmptyMessageType,

    /// A definition declared no versions.
    #[error("Schema definition for {message_type} declares no versions")]
    NoVersions { message_type: String },

    /// The all-versions wildcard is reserved for channel configuration.
    #[error("Schema definition for {message_type} uses the wildcard version")]
    WildcardVersion { message_type: String },

    /// The same field path appears twice in one definition.
    #[error("Duplicate field {path} in {uid}")]
    DuplicateField { uid: MessageUid, path: String },

    /// The message root must be anchored at the document root.
    #[error("Root path {path} of {message_type} is not absolute")]
    RootNotAbsolute { message_type: String, path: String },

    /// A path expression did not parse.
    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    /// The schema source could not be read.
    #[error("Failed to read schema source: {0}")]
    Io(#[from] std::io::Error),

    /// The schema source is not valid JSON for the expected shape.
    #[error("Malformed schema source: {0}")]
    Json(#[from] serde_json::Error),
}
