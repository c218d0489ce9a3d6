//! # Schema Source
//!
//! Serialised form of a message schema. One entry describes a message type
//! for a set of protocol versions that share the same layout:
//!
//! ```json
//! {
//!   "messages": [
//!     {
//!       "type": "VERes",
//!       "versions": ["1.0.1", "1.0.2"],
//!       "root": "/ThreeDSecure/Message/VERes",
//!       "terminal": { "policy": "unless_field_equals", "path": "CH/enrolled", "value": "Y" },
//!       "fields": [ { "path": "CH/enrolled", "mandatory": true, "encrypt": false } ]
//!     }
//!   ]
//! }
//! ```
//!
//! `terminal` is optional; when absent the built-in 3-D Secure rule for the
//! message type applies.

use crate::domain::{FieldDefinition, SchemaError, TerminalPolicy};
use serde::{Deserialize, Serialize};
use shared_types::ElementPath;
use std::path::Path;

/// Bundled 3-D Secure 1.0.x schema.
pub const THREE_D_SECURE_SCHEMA: &str = include_str!("../schema/three_d_secure.json");

/// A complete schema document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaSource {
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
}

/// One message type at one or more versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(rename = "type")]
    pub message_type: String,
    pub versions: Vec<String>,
    pub root: ElementPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalPolicy>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl SchemaSource {
    /// Parse a schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Json` when the text is not a schema document
    /// (including unparsable field paths).
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Canonical pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Json` if serialisation fails.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and parse a schema document from disk.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Io` when the file cannot be read and
    /// `SchemaError::Json` when it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// The bundled 3-D Secure schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Json` if the bundled resource is malformed.
    pub fn three_d_secure() -> Result<Self, SchemaError> {
        Self::from_json(THREE_D_SECURE_SCHEMA)
    }
}
