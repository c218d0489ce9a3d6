//! # Schema Entities
//!
//! Immutable definitions loaded from the schema source.

use serde::{Deserialize, Serialize};
use shared_types::{Element, ElementPath, MessageUid};

/// Policy for a field declared by the protocol schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Path relative to the message root element.
    pub path: ElementPath,
    /// Field must survive extraction even when a channel does not list it.
    #[serde(default)]
    pub mandatory: bool,
    /// Field is encrypted unless a channel override says otherwise.
    #[serde(default, rename = "encrypt")]
    pub must_encrypt: bool,
}

impl FieldDefinition {
    pub fn new(path: ElementPath, mandatory: bool, must_encrypt: bool) -> Self {
        Self {
            path,
            mandatory,
            must_encrypt,
        }
    }
}

/// Rule deciding whether a message closes its purchase transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Never terminal.
    #[default]
    Never,
    /// Always terminal.
    Always,
    /// Terminal unless the value at `path` (relative to the message root) is
    /// exactly `value`. A missing value counts as "not equal".
    UnlessFieldEquals { path: ElementPath, value: String },
}

impl TerminalPolicy {
    /// Evaluate against a message root element.
    #[must_use]
    pub fn is_terminal(&self, body: &Element) -> bool {
        match self {
            TerminalPolicy::Never => false,
            TerminalPolicy::Always => true,
            TerminalPolicy::UnlessFieldEquals { path, value } => {
                body.value_at(path) != Some(value.as_str())
            }
        }
    }

    /// Built-in 3-D Secure rule for a message type, used when the schema
    /// has no definition for the message.
    ///
    /// - `PARes` (authentication result): always terminal
    /// - `VERes` (enrollment result): terminal unless `CH/enrolled` is `Y`
    /// - `Error`, `IReq`: always terminal
    #[must_use]
    pub fn three_d_secure(message_type: &str) -> Self {
        match message_type {
            "PARes" | "Error" | "IReq" => TerminalPolicy::Always,
            "VERes" => match ElementPath::parse("CH/enrolled") {
                Ok(path) => TerminalPolicy::UnlessFieldEquals {
                    path,
                    value: "Y".to_string(),
                },
                Err(_) => TerminalPolicy::Always,
            },
            _ => TerminalPolicy::Never,
        }
    }
}

/// Schema definition of one message type at one protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    pub uid: MessageUid,
    /// Absolute path of the message root element inside the document.
    pub root: ElementPath,
    /// Fields in schema order.
    pub fields: Vec<FieldDefinition>,
    pub terminal: TerminalPolicy,
}

impl MessageDefinition {
    /// Field definition by path.
    pub fn field(&self, path: &ElementPath) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| &f.path == path)
    }

    /// Fields that extraction must always keep.
    pub fn mandatory_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.mandatory)
    }

    /// Locate the message root element inside a document.
    pub fn root_of<'a>(&self, document: &'a Element) -> Option<&'a Element> {
        document.resolve(&self.root)
    }

    /// Mutable variant of [`MessageDefinition::root_of`].
    pub fn root_of_mut<'a>(&self, document: &'a mut Element) -> Option<&'a mut Element> {
        document.resolve_mut(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn veres(enrolled: Option<&str>) -> Element {
        let mut ch = Element::new("CH");
        if let Some(flag) = enrolled {
            ch.push_child(Element::new("enrolled").with_text(flag));
        }
        Element::new("VERes").with_child(ch)
    }

    #[test]
    fn test_builtin_policies() {
        assert_eq!(TerminalPolicy::three_d_secure("PARes"), TerminalPolicy::Always);
        assert_eq!(TerminalPolicy::three_d_secure("Error"), TerminalPolicy::Always);
        assert_eq!(TerminalPolicy::three_d_secure("IReq"), TerminalPolicy::Always);
        assert_eq!(TerminalPolicy::three_d_secure("PAReq"), TerminalPolicy::Never);
        assert_eq!(TerminalPolicy::three_d_secure("VEReq"), TerminalPolicy::Never);
    }

    #[test]
    fn test_enrollment_rule() {
        let policy = TerminalPolicy::three_d_secure("VERes");
        assert!(!policy.is_terminal(&veres(Some("Y"))));
        assert!(policy.is_terminal(&veres(Some("N"))));
        assert!(policy.is_terminal(&veres(Some("U"))));
        assert!(policy.is_terminal(&veres(Some("y"))));
        assert!(policy.is_terminal(&veres(None)));
    }

    #[test]
    fn test_policy_serde_shape() {
        let policy = TerminalPolicy::three_d_secure("VERes");
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"policy": "unless_field_equals", "path": "CH/enrolled", "value": "Y"})
        );
        let never: TerminalPolicy = serde_json::from_str(r#"{"policy":"never"}"#).unwrap();
        assert_eq!(never, TerminalPolicy::Never);
    }
}
