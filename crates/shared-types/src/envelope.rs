//! # `ProtocolMessage` Envelope
//!
//! The wrapper every protocol message travels in across the transport.
//!
//! ## Header Properties
//!
//! Selectors are evaluated against header properties only, never against the
//! document body:
//!
//! | Property | Source |
//! |----------|--------|
//! | `MerchantID` | merchant the message was exchanged for |
//! | `MessageType` | `uid.message_type` |
//! | `MessageVersion` | `uid.version` |
//! | `CorrelationID` | purchase transaction identifier, when known |

use crate::document::Element;
use crate::entities::{MessageUid, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header property names understood by selectors.
pub mod headers {
    pub const MERCHANT_ID: &str = "MerchantID";
    pub const MESSAGE_TYPE: &str = "MessageType";
    pub const MESSAGE_VERSION: &str = "MessageVersion";
    pub const CORRELATION_ID: &str = "CorrelationID";
}

/// A protocol message as published on the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    /// Unique identifier of this publication.
    pub id: Uuid,
    /// Merchant the message belongs to.
    pub merchant_id: String,
    /// Message type and protocol version.
    pub uid: MessageUid,
    /// Purchase transaction identifier shared by every message of one flow.
    pub correlation_id: Option<String>,
    /// When the protocol engine emitted the message.
    pub timestamp: Timestamp,
    /// Decoded message document.
    pub document: Element,
}

impl ProtocolMessage {
    /// Create a message with a fresh publication id.
    pub fn new(
        merchant_id: impl Into<String>,
        uid: MessageUid,
        correlation_id: Option<String>,
        timestamp: Timestamp,
        document: Element,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            merchant_id: merchant_id.into(),
            uid,
            correlation_id,
            timestamp,
            document,
        }
    }

    /// Look up a header property by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        match name {
            headers::MERCHANT_ID => Some(&self.merchant_id),
            headers::MESSAGE_TYPE => Some(&self.uid.message_type),
            headers::MESSAGE_VERSION => Some(&self.uid.version),
            headers::CORRELATION_ID => self.correlation_id.as_deref(),
            _ => None,
        }
    }
}
