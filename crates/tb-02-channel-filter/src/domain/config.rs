//! # Channel Config Documents
//!
//! Loading, serialising and validating channel configurations.
//!
//! ```json
//! {
//!   "id": "acquirer-feed",
//!   "kind": "message",
//!   "merchants": ["Merchant1", "Merchant2"],
//!   "messages": [
//!     { "type": "PARes", "version": "", "fields": [
//!       { "path": "pan", "encrypt": "false", "mask": "Y{0}#{4}" }
//!     ] }
//!   ]
//! }
//! ```
//!
//! An empty `version` subscribes to every version of the type.

use super::entities::ChannelConfig;
use super::errors::ChannelConfigError;
use crate::ports::TemplateValidator;
use std::path::Path;
use tb_01_message_schema::SchemaRegistry;
use tracing::warn;

impl ChannelConfig {
    /// Parse a channel configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ChannelConfigError::Json` for malformed documents, bad field
    /// paths, bad encrypt flags and repeated message entries.
    pub fn from_json(text: &str) -> Result<Self, ChannelConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty-printed document. Messages are emitted in (type, version)
    /// order, merchants in configured order.
    ///
    /// # Errors
    ///
    /// Returns `ChannelConfigError::Json` if serialisation fails.
    pub fn to_json(&self) -> Result<String, ChannelConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ChannelConfigError::Io` or `ChannelConfigError::Json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChannelConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Reject structurally invalid configurations.
    ///
    /// Messages unknown to the schema are accepted with a warning; they are
    /// delivered unfiltered.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(
        &self,
        registry: &SchemaRegistry,
        templates: &dyn TemplateValidator,
    ) -> Result<(), ChannelConfigError> {
        if self.id().trim().is_empty() {
            return Err(ChannelConfigError::EmptyId);
        }
        if self.merchants().iter().any(|m| m.trim().is_empty()) {
            return Err(ChannelConfigError::BlankMerchant {
                channel: self.id().to_string(),
            });
        }
        if self.is_purchase() && self.has_field_overrides() {
            return Err(ChannelConfigError::PurchaseFieldFilter {
                channel: self.id().to_string(),
            });
        }

        for (uid, fields) in self.messages() {
            if uid.message_type.trim().is_empty() {
                return Err(ChannelConfigError::EmptyMessageType {
                    channel: self.id().to_string(),
                });
            }

            let known = if uid.is_wildcard() {
                !registry.known_versions(&uid.message_type).is_empty()
            } else {
                registry.lookup(uid).is_some()
            };
            if !known {
                warn!(
                    channel = %self.id(),
                    message = %uid,
                    "Message not in schema, will be delivered unfiltered"
                );
            }

            for field in fields {
                let Some(template) = &field.mask else {
                    continue;
                };
                if field.encrypt {
                    return Err(ChannelConfigError::EncryptedAndMasked {
                        uid: uid.clone(),
                        path: field.path.to_string(),
                    });
                }
                templates
                    .check(template)
                    .map_err(|reason| ChannelConfigError::InvalidMask {
                        uid: uid.clone(),
                        path: field.path.to_string(),
                        reason,
                    })?;
            }
        }

        Ok(())
    }
}
