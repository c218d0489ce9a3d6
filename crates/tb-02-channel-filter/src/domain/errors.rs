//! # Domain Errors
//!
//! Errors raised while loading, validating or replacing a channel
//! configuration. A rejected config never replaces the one in force.

use shared_types::MessageUid;
use thiserror::Error;

/// Errors from channel configuration handling.
#[derive(Debug, Error)]
pub enum ChannelConfigError {
    /// The channel id is empty.
    #[error("Channel id is empty")]
    EmptyId,

    /// A merchant id is empty or whitespace.
    #[error("Channel {channel} lists a blank merchant id")]
    BlankMerchant { channel: String },

    /// A message entry has an empty type name.
    #[error("Channel {channel} subscribes to a message with an empty type")]
    EmptyMessageType { channel: String },

    /// A field is flagged for encryption and also carries a mask.
    #[error("Field {path} of {uid} is both encrypted and masked")]
    EncryptedAndMasked { uid: MessageUid, path: String },

    /// A mask template does not parse.
    #[error("Invalid mask for field {path} of {uid}: {reason}")]
    InvalidMask {
        uid: MessageUid,
        path: String,
        reason: String,
    },

    /// Purchase channels must see whole messages.
    #[error("Purchase channel {channel} does not accept field overrides")]
    PurchaseFieldFilter { channel: String },

    /// Purchase channels cannot be reconfigured once running.
    #[error("Purchase channel {channel} does not accept reconfiguration")]
    PurchaseReconfiguration { channel: String },

    /// A replacement config carries a different channel id.
    #[error("Replacement config for {expected} carries id {found}")]
    IdMismatch { expected: String, found: String },

    /// The configuration file could not be read.
    #[error("Failed to read channel config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is malformed.
    #[error("Malformed channel config: {0}")]
    Json(#[from] serde_json::Error),
}
