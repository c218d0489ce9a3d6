//! # Schema Registry
//!
//! Read-only index `MessageUid → MessageDefinition`, built once at startup and
//! shared as `Arc<SchemaRegistry>`. No interior mutability: concurrent reads
//! need no locking.

use super::entities::{MessageDefinition, TerminalPolicy};
use super::errors::SchemaError;
use super::FieldDefinition;
use crate::source::{MessageEntry, SchemaSource};
use shared_types::{Element, MessageUid};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Indexed message schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    definitions: BTreeMap<MessageUid, MessageDefinition>,
}

impl SchemaRegistry {
    /// Build a registry from a parsed schema source.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` for empty type names, missing or wildcard
    /// versions, relative root paths, duplicate fields within a definition and
    /// duplicate (type, version) pairs across entries.
    pub fn from_source(source: &SchemaSource) -> Result<Self, SchemaError> {
        let mut definitions = BTreeMap::new();

        for entry in &source.messages {
            validate_entry(entry)?;

            let terminal = entry
                .terminal
                .clone()
                .unwrap_or_else(|| TerminalPolicy::three_d_secure(&entry.message_type));

            for version in &entry.versions {
                let uid = MessageUid::new(entry.message_type.clone(), version.clone());
                let definition = MessageDefinition {
                    uid: uid.clone(),
                    root: entry.root.clone(),
                    fields: entry.fields.clone(),
                    terminal: terminal.clone(),
                };
                if definitions.insert(uid.clone(), definition).is_some() {
                    return Err(SchemaError::DuplicateDefinition(uid));
                }
            }
        }

        info!(definitions = definitions.len(), "Message schema loaded");
        Ok(Self { definitions })
    }

    /// Registry for the bundled 3-D Secure 1.0.x schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the bundled resource is malformed.
    pub fn three_d_secure() -> Result<Self, SchemaError> {
        Self::from_source(&SchemaSource::three_d_secure()?)
    }

    /// Definition for an exact (type, version).
    pub fn lookup(&self, uid: &MessageUid) -> Option<&MessageDefinition> {
        let found = self.definitions.get(uid);
        if found.is_none() {
            debug!(message = %uid, "No schema definition");
        }
        found
    }

    /// Field definitions for (type, version); empty when unknown.
    pub fn fields_for(&self, message_type: &str, version: &str) -> &[FieldDefinition] {
        self.lookup(&MessageUid::new(message_type, version))
            .map(|d| d.fields.as_slice())
            .unwrap_or_default()
    }

    /// Every version the schema knows for a message type.
    pub fn known_versions(&self, message_type: &str) -> BTreeSet<String> {
        self.definitions
            .keys()
            .filter(|uid| uid.message_type == message_type)
            .map(|uid| uid.version.clone())
            .collect()
    }

    /// Every message type the schema knows.
    pub fn message_types(&self) -> BTreeSet<&str> {
        self.definitions
            .keys()
            .map(|uid| uid.message_type.as_str())
            .collect()
    }

    /// Whether a message body (the message root element) closes its purchase
    /// transaction. Unknown messages fall back to the built-in rule for their
    /// type.
    pub fn is_terminal(&self, uid: &MessageUid, body: &Element) -> bool {
        match self.definitions.get(uid) {
            Some(definition) => definition.terminal.is_terminal(body),
            None => TerminalPolicy::three_d_secure(&uid.message_type).is_terminal(body),
        }
    }

    /// Iterate definitions in (type, version) order.
    pub fn definitions(&self) -> impl Iterator<Item = &MessageDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Serialisable form. Versions of one type with identical layout are
    /// folded back into a single entry.
    pub fn to_source(&self) -> SchemaSource {
        let mut messages: Vec<MessageEntry> = Vec::new();

        for definition in self.definitions.values() {
            let shared = messages.iter_mut().find(|entry| {
                entry.message_type == definition.uid.message_type
                    && entry.root == definition.root
                    && entry.fields == definition.fields
                    && entry.terminal.as_ref() == Some(&definition.terminal)
            });

            match shared {
                Some(entry) => entry.versions.push(definition.uid.version.clone()),
                None => messages.push(MessageEntry {
                    message_type: definition.uid.message_type.clone(),
                    versions: vec![definition.uid.version.clone()],
                    root: definition.root.clone(),
                    terminal: Some(definition.terminal.clone()),
                    fields: definition.fields.clone(),
                }),
            }
        }

        SchemaSource { messages }
    }
}

fn validate_entry(entry: &MessageEntry) -> Result<(), SchemaError> {
    if entry.message_type.trim().is_empty() {
        return Err(SchemaError::EmptyMessageType);
    }
    if entry.versions.is_empty() {
        return Err(SchemaError::NoVersions {
            message_type: entry.message_type.clone(),
        });
    }
    if entry.versions.iter().any(|v| v.is_empty()) {
        return Err(SchemaError::WildcardVersion {
            message_type: entry.message_type.clone(),
        });
    }
    if !entry.root.is_absolute() {
        return Err(SchemaError::RootNotAbsolute {
            message_type: entry.message_type.clone(),
            path: entry.root.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for field in &entry.fields {
        if !seen.insert(&field.path) {
            let version = entry.versions.first().cloned().unwrap_or_default();
            return Err(SchemaError::DuplicateField {
                uid: MessageUid::new(entry.message_type.clone(), version),
                path: field.path.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ElementPath;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::three_d_secure().unwrap()
    }

    fn entry(message_type: &str, versions: &[&str]) -> MessageEntry {
        MessageEntry {
            message_type: message_type.to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            root: ElementPath::parse(&format!("/ThreeDSecure/Message/{message_type}")).unwrap(),
            terminal: None,
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_known_and_unknown() {
        let registry = registry();
        let veres = registry.lookup(&MessageUid::new("VERes", "1.0.2")).unwrap();
        assert_eq!(veres.root.to_string(), "/ThreeDSecure/Message/VERes");
        assert!(registry.lookup(&MessageUid::new("VERes", "9.9.9")).is_none());
        assert!(registry.lookup(&MessageUid::new("CRReq", "1.0.2")).is_none());
    }

    #[test]
    fn test_fields_for_miss_is_empty() {
        let registry = registry();
        assert!(!registry.fields_for("PARes", "1.0.2").is_empty());
        assert!(registry.fields_for("PARes", "2.0.1").is_empty());
    }

    #[test]
    fn test_known_versions() {
        let registry = registry();
        let versions: Vec<String> = registry.known_versions("PAReq").into_iter().collect();
        assert_eq!(versions, ["1.0.1", "1.0.2"]);
        assert!(registry.known_versions("Unknown").is_empty());
        assert_eq!(registry.message_types().len(), 6);
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn test_encryption_flags() {
        let registry = registry();
        let pares = registry.lookup(&MessageUid::new("PARes", "1.0.2")).unwrap();
        let cavv = pares.field(&ElementPath::parse("TX/cavv").unwrap()).unwrap();
        assert!(cavv.must_encrypt);
        let status = pares.field(&ElementPath::parse("TX/status").unwrap()).unwrap();
        assert!(!status.must_encrypt);
        assert!(status.mandatory);
    }

    #[test]
    fn test_is_terminal_uses_schema_then_builtin() {
        let registry = registry();
        let enrolled = Element::new("VERes")
            .with_child(Element::new("CH").with_child(Element::new("enrolled").with_text("Y")));
        let pares = Element::new("PARes");

        assert!(!registry.is_terminal(&MessageUid::new("VERes", "1.0.2"), &enrolled));
        assert!(registry.is_terminal(&MessageUid::new("PARes", "1.0.2"), &pares));
        assert!(!registry.is_terminal(&MessageUid::new("PAReq", "1.0.2"), &Element::new("PAReq")));
        // Unknown version falls back to the built-in rule.
        assert!(registry.is_terminal(&MessageUid::new("PARes", "2.0.1"), &pares));
        assert!(!registry.is_terminal(&MessageUid::new("VERes", "2.0.1"), &enrolled));
    }

    #[test]
    fn test_schema_policy_overrides_builtin() {
        let mut custom = entry("PARes", &["1.0.2"]);
        custom.terminal = Some(TerminalPolicy::Never);
        let registry = SchemaRegistry::from_source(&SchemaSource {
            messages: vec![custom],
        })
        .unwrap();

        assert!(!registry.is_terminal(&MessageUid::new("PARes", "1.0.2"), &Element::new("PARes")));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let source = SchemaSource {
            messages: vec![entry("VEReq", &["1.0.2"]), entry("VEReq", &["1.0.1", "1.0.2"])],
        };
        assert!(matches!(
            SchemaRegistry::from_source(&source),
            Err(SchemaError::DuplicateDefinition(uid)) if uid == MessageUid::new("VEReq", "1.0.2")
        ));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let mut blank = entry("VEReq", &["1.0.2"]);
        blank.message_type = " ".to_string();
        let empty_type = SchemaSource {
            messages: vec![blank],
        };
        assert!(matches!(
            SchemaRegistry::from_source(&empty_type),
            Err(SchemaError::EmptyMessageType)
        ));

        let wildcard = SchemaSource {
            messages: vec![entry("VEReq", &[""])],
        };
        assert!(matches!(
            SchemaRegistry::from_source(&wildcard),
            Err(SchemaError::WildcardVersion { .. })
        ));

        let no_versions = SchemaSource {
            messages: vec![entry("VEReq", &[])],
        };
        assert!(matches!(
            SchemaRegistry::from_source(&no_versions),
            Err(SchemaError::NoVersions { .. })
        ));

        let mut relative = entry("VEReq", &["1.0.2"]);
        relative.root = ElementPath::parse("Message/VEReq").unwrap();
        assert!(matches!(
            SchemaRegistry::from_source(&SchemaSource {
                messages: vec![relative]
            }),
            Err(SchemaError::RootNotAbsolute { .. })
        ));

        let mut duplicated = entry("VEReq", &["1.0.2"]);
        let pan = FieldDefinition::new(ElementPath::parse("pan").unwrap(), true, true);
        duplicated.fields = vec![pan.clone(), pan];
        assert!(matches!(
            SchemaRegistry::from_source(&SchemaSource {
                messages: vec![duplicated]
            }),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_to_source_roundtrip() {
        let registry = registry();
        let source = registry.to_source();
        assert_eq!(source.messages.len(), 6);
        assert_eq!(SchemaRegistry::from_source(&source).unwrap(), registry);
    }
}
