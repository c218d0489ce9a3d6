//! # Field Transformer
//!
//! Schema-driven document operations run for each delivered message:
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `extract` | prune the message root down to configured and mandatory fields |
//! | `mask` | replace values with their template rendering |
//! | `encrypt` | replace values with ciphertext |
//! | `decrypt` | inverse of `encrypt` |
//! | `apply` | extract, then mask, then encrypt |
//!
//! Every operation takes the field overrides of the receiving channel
//! (`None` when the channel has none for the message) and the whole document.
//! A message without a schema definition is left untouched, as are fields
//! missing from the document. Mask and encrypt failures are scoped to the
//! field and reported in a `TransformReport`.

use crate::domain::context::MaskContext;
use crate::domain::errors::TransformError;
use crate::domain::mask::MaskTemplate;
use crate::domain::report::{Operation, TransformReport};
use crate::ports::FieldEncryptor;
use shared_types::{Element, ElementPath, MessageUid};
use std::collections::HashMap;
use std::sync::Arc;
use tb_01_message_schema::{MessageDefinition, SchemaRegistry};
use tb_02_channel_filter::MessageFieldBean;
use tracing::{debug, warn};

/// Runs field transforms against protocol documents.
pub struct FieldTransformer {
    registry: Arc<SchemaRegistry>,
    encryptor: Arc<dyn FieldEncryptor>,
    context: MaskContext,
}

impl FieldTransformer {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        encryptor: Arc<dyn FieldEncryptor>,
        context: MaskContext,
    ) -> Self {
        Self {
            registry,
            encryptor,
            context,
        }
    }

    pub fn context(&self) -> &MaskContext {
        &self.context
    }

    // =========================================================================
    // Extract
    // =========================================================================

    /// Prune the message root to the configured fields, their ancestors and
    /// every mandatory schema field. Elements above the message root are
    /// untouched. Running it twice gives the same document.
    pub fn extract(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
    ) {
        let Some(fields) = fields.filter(|f| !f.is_empty()) else {
            return;
        };
        let Some(definition) = self.registry.lookup(uid) else {
            return;
        };

        let kept: Vec<Vec<String>> = fields
            .iter()
            .map(|f| &f.path)
            .chain(definition.mandatory_fields().map(|f| &f.path))
            .filter_map(|path| steps_from_root(path, &definition.root))
            .collect();

        let Some(root) = definition.root_of_mut(document) else {
            debug!(message = %uid, "Message root not in document, nothing to extract");
            return;
        };

        let before = count_elements(root);
        let borrowed: Vec<&[String]> = kept.iter().map(Vec::as_slice).collect();
        prune(root, &borrowed);
        debug!(
            message = %uid,
            kept_paths = kept.len(),
            removed = before - count_elements(root),
            "Fields extracted"
        );
    }

    // =========================================================================
    // Encrypt / Decrypt
    // =========================================================================

    /// Encrypt every field whose override says so, or whose schema
    /// definition requires it when the channel has no override.
    pub fn encrypt(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
    ) -> TransformReport {
        self.cipher_pass(uid, fields, document, Operation::Encrypt)
    }

    /// Decrypt the fields `encrypt` would have encrypted.
    pub fn decrypt(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
    ) -> TransformReport {
        self.cipher_pass(uid, fields, document, Operation::Decrypt)
    }

    fn cipher_pass(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
        operation: Operation,
    ) -> TransformReport {
        let mut report = TransformReport::new();
        let Some(definition) = self.registry.lookup(uid) else {
            return report;
        };
        let targets = encrypted_paths(definition, fields.unwrap_or_default());
        let Some(root) = definition.root_of_mut(document) else {
            return report;
        };

        for path in targets {
            let mut failure = None;
            let visited = root.for_each_value_mut(path, |value| {
                let result = match operation {
                    Operation::Decrypt => self.encryptor.decrypt(value),
                    _ => self.encryptor.encrypt(value),
                };
                match result {
                    Ok(output) => *value = output,
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            });

            match failure {
                Some(error) => {
                    warn!(message = %uid, field = %path, operation = %operation, error = %error, "Field transform failed");
                    report.record(path.to_string(), operation, error);
                }
                None => report.transformed += visited,
            }
        }

        report
    }

    // =========================================================================
    // Mask
    // =========================================================================

    /// Render the mask template of every override that carries one and is
    /// not encrypted.
    pub fn mask(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
    ) -> TransformReport {
        let mut report = TransformReport::new();
        let Some(fields) = fields else {
            return report;
        };
        let Some(definition) = self.registry.lookup(uid) else {
            return report;
        };
        let Some(root) = definition.root_of_mut(document) else {
            return report;
        };

        for field in fields.iter().filter(|f| !f.encrypt) {
            let Some(template) = &field.mask else {
                continue;
            };
            let template = match MaskTemplate::parse(template) {
                Ok(template) => template,
                Err(e) => {
                    warn!(message = %uid, field = %field.path, error = %e, "Invalid mask template");
                    report.record(field.path.to_string(), Operation::Mask, e.into());
                    continue;
                }
            };

            let mut failure: Option<TransformError> = None;
            let visited = root.for_each_value_mut(&field.path, |value| {
                match template.render(value, &self.context) {
                    Ok(masked) => *value = masked,
                    Err(e) => {
                        failure.get_or_insert(e.into());
                    }
                }
            });

            match failure {
                Some(error) => {
                    warn!(message = %uid, field = %field.path, error = %error, "Field mask failed");
                    report.record(field.path.to_string(), Operation::Mask, error);
                }
                None => report.transformed += visited,
            }
        }

        report
    }

    // =========================================================================
    // Apply
    // =========================================================================

    /// Full per-delivery pipeline: extract, mask, encrypt.
    pub fn apply(
        &self,
        uid: &MessageUid,
        fields: Option<&[MessageFieldBean]>,
        document: &mut Element,
    ) -> TransformReport {
        self.extract(uid, fields, document);
        let mut report = self.mask(uid, fields, document);
        report.merge(self.encrypt(uid, fields, document));
        report
    }
}

/// Paths to encrypt: schema fields take the override flag when one exists
/// and their own flag otherwise; overrides for fields outside the schema
/// count when they ask for encryption.
fn encrypted_paths<'a>(
    definition: &'a MessageDefinition,
    overrides: &'a [MessageFieldBean],
) -> Vec<&'a ElementPath> {
    let by_path: HashMap<&ElementPath, &MessageFieldBean> =
        overrides.iter().map(|f| (&f.path, f)).collect();

    let mut paths: Vec<&ElementPath> = definition
        .fields
        .iter()
        .filter(|f| by_path.get(&f.path).map_or(f.must_encrypt, |o| o.encrypt))
        .map(|f| &f.path)
        .collect();

    for field in overrides {
        if field.encrypt && definition.field(&field.path).is_none() && !paths.contains(&&field.path) {
            paths.push(&field.path);
        }
    }
    paths
}

/// Element steps of `path` below the message root. Absolute paths must lie
/// under the root.
fn steps_from_root(path: &ElementPath, root: &ElementPath) -> Option<Vec<String>> {
    if !path.is_absolute() {
        return Some(path.steps().to_vec());
    }
    path.steps()
        .strip_prefix(root.steps())
        .map(<[String]>::to_vec)
}

/// Keep children named by the first step of some kept path. A path that ends
/// at a child keeps its whole subtree; longer paths recurse.
fn prune(element: &mut Element, kept: &[&[String]]) {
    element.children.retain_mut(|child| {
        let below: Vec<&[String]> = kept
            .iter()
            .filter_map(|&steps| match steps.split_first() {
                Some((head, rest)) if *head == child.name => Some(rest),
                _ => None,
            })
            .collect();

        if below.is_empty() {
            return false;
        }
        if !below.iter().any(|rest| rest.is_empty()) {
            prune(child, &below);
        }
        true
    });
}

fn count_elements(element: &Element) -> usize {
    1 + element.children.iter().map(count_elements).sum::<usize>()
}
