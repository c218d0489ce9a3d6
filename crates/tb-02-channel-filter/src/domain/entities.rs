//! # Channel Entities
//!
//! `MessageFieldBean` overrides and the `ChannelConfig` they live in.
//!
//! ## Equality
//!
//! Field lists keep their configured order for processing, but two configs
//! are compared set-wise: merchant ids as a set, and each message's field
//! overrides as a set of beans.

use serde::{Deserialize, Deserializer, Serialize};
use shared_types::{ElementPath, MessageUid};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Per-channel override for one field of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFieldBean {
    /// Path relative to the message root.
    pub path: ElementPath,
    /// Encrypt this field. Accepts `true`/`false` or `"true"`/`"false"`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub encrypt: bool,
    /// Mask template applied when the field is not encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
}

impl MessageFieldBean {
    /// Plain override: keep the field, no encryption, no mask.
    pub fn new(path: ElementPath) -> Self {
        Self {
            path,
            encrypt: false,
            mask: None,
        }
    }

    /// Builder: set the encrypt flag.
    #[must_use]
    pub fn encrypted(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Builder: set the mask template.
    #[must_use]
    pub fn masked(mut self, template: impl Into<String>) -> Self {
        self.mask = Some(template.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", found \"{other}\""
            ))),
        },
    }
}

/// How a channel hands messages downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Each matching message is transformed and delivered on its own.
    #[default]
    Message,
    /// Messages are aggregated per purchase transaction. Such channels accept
    /// no field overrides and no reconfiguration.
    Purchase,
}

/// Subscription and transform policy of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ChannelDocument", into = "ChannelDocument")]
pub struct ChannelConfig {
    id: String,
    kind: ChannelKind,
    merchants: Vec<String>,
    messages: BTreeMap<MessageUid, Vec<MessageFieldBean>>,
}

impl ChannelConfig {
    /// Empty per-message channel: all merchants, no messages.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Empty purchase channel.
    pub fn purchase(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ChannelKind::Purchase,
            ..Self::default()
        }
    }

    /// Builder: append a merchant id (duplicates are ignored).
    #[must_use]
    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        let merchant = merchant.into();
        if !self.merchants.contains(&merchant) {
            self.merchants.push(merchant);
        }
        self
    }

    /// Builder: subscribe to a message with the given field overrides. A
    /// repeated uid replaces the earlier list.
    #[must_use]
    pub fn with_message(mut self, uid: MessageUid, fields: Vec<MessageFieldBean>) -> Self {
        self.messages.insert(uid, fields);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[must_use]
    pub fn is_purchase(&self) -> bool {
        self.kind == ChannelKind::Purchase
    }

    /// Merchant ids in configured order. Empty means every merchant.
    pub fn merchants(&self) -> &[String] {
        &self.merchants
    }

    /// Subscribed messages with their override lists.
    pub fn messages(&self) -> &BTreeMap<MessageUid, Vec<MessageFieldBean>> {
        &self.messages
    }

    /// Field overrides for a delivered message. An exact (type, version)
    /// entry wins over the type's all-versions entry.
    pub fn fields_for(&self, uid: &MessageUid) -> Option<&[MessageFieldBean]> {
        self.messages
            .get(uid)
            .or_else(|| self.messages.get(&MessageUid::any_version(uid.message_type.clone())))
            .map(Vec::as_slice)
    }

    /// Whether any subscribed message carries field overrides.
    #[must_use]
    pub fn has_field_overrides(&self) -> bool {
        self.messages.values().any(|fields| !fields.is_empty())
    }

    /// Merchant ids as a set.
    pub fn merchant_set(&self) -> BTreeSet<&str> {
        self.merchants.iter().map(String::as_str).collect()
    }

    /// Set-wise equality of everything that shapes the subscription and the
    /// per-field transforms.
    #[must_use]
    pub fn content_eq(&self, other: &ChannelConfig) -> bool {
        self.id == other.id && self.kind == other.kind && !self.requires_resubscription(other)
    }

    /// Whether replacing `previous` with `self` changes the merchant set or
    /// any message's field set. Equal configs never resubscribe.
    #[must_use]
    pub fn requires_resubscription(&self, previous: &ChannelConfig) -> bool {
        if self.merchant_set() != previous.merchant_set() {
            return true;
        }
        if self.messages.len() != previous.messages.len() {
            return true;
        }
        self.messages.iter().any(|(uid, fields)| match previous.messages.get(uid) {
            Some(old) => field_set(fields) != field_set(old),
            None => true,
        })
    }
}

fn field_set(fields: &[MessageFieldBean]) -> HashSet<&MessageFieldBean> {
    fields.iter().collect()
}

// =============================================================================
// Serialised form
// =============================================================================

/// On-disk shape of a channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChannelDocument {
    id: String,
    #[serde(default)]
    kind: ChannelKind,
    #[serde(default)]
    merchants: Vec<String>,
    #[serde(default)]
    messages: Vec<MessageDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageDocument {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    fields: Vec<MessageFieldBean>,
}

impl TryFrom<ChannelDocument> for ChannelConfig {
    type Error = String;

    fn try_from(doc: ChannelDocument) -> Result<Self, Self::Error> {
        let mut config = ChannelConfig {
            id: doc.id,
            kind: doc.kind,
            merchants: Vec::with_capacity(doc.merchants.len()),
            messages: BTreeMap::new(),
        };
        for merchant in doc.merchants {
            config = config.with_merchant(merchant);
        }
        for message in doc.messages {
            let uid = MessageUid::new(message.message_type, message.version);
            if config.messages.contains_key(&uid) {
                return Err(format!("message {uid} listed twice"));
            }
            config.messages.insert(uid, message.fields);
        }
        Ok(config)
    }
}

impl From<ChannelConfig> for ChannelDocument {
    fn from(config: ChannelConfig) -> Self {
        ChannelDocument {
            id: config.id,
            kind: config.kind,
            merchants: config.merchants,
            messages: config
                .messages
                .into_iter()
                .map(|(uid, fields)| MessageDocument {
                    message_type: uid.message_type,
                    version: uid.version,
                    fields,
                })
                .collect(),
        }
    }
}
