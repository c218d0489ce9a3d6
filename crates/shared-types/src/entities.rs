//! # Core Entities
//!
//! Message identity shared by the schema registry, channel configurations and
//! the transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Version value meaning "every version of this message type".
pub const ANY_VERSION: &str = "";

/// Identity of a protocol message: its type name and protocol version.
///
/// Equality and ordering are by `(message_type, version)`. The empty version
/// (`ANY_VERSION`) is a wildcard used when a channel subscribes to every
/// version of a type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageUid {
    /// Message type name, e.g. `VERes`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Protocol version, e.g. `1.0.2`. Empty for "all versions".
    #[serde(default)]
    pub version: String,
}

impl MessageUid {
    /// Create a new identity.
    pub fn new(message_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            version: version.into(),
        }
    }

    /// Identity matching every version of `message_type`.
    pub fn any_version(message_type: impl Into<String>) -> Self {
        Self::new(message_type, ANY_VERSION)
    }

    /// Whether this identity is the all-versions wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.version == ANY_VERSION
    }

    /// Whether this identity covers `other` (equal, or wildcard of the same type).
    #[must_use]
    pub fn covers(&self, other: &MessageUid) -> bool {
        self.message_type == other.message_type
            && (self.is_wildcard() || self.version == other.version)
    }
}

impl fmt::Display for MessageUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            write!(f, "{}/*", self.message_type)
        } else {
            write!(f, "{}/{}", self.message_type, self.version)
        }
    }
}
