//! # Selector Compiler
//!
//! Turns a `ChannelConfig` into the selector expression the transport routes
//! messages with:
//!
//! ```text
//! [MerchantID in ('m1', 'm2')] [AND] [( (MessageType = 't1' AND MessageVersion = 'v1') OR MessageType in ('t2') )]
//! ```
//!
//! ## Version collapsing
//!
//! A type whose configured versions include the `""` wildcard, or cover every
//! version the schema knows for it, is matched by type alone. Collapsed types
//! share a single `MessageType in (...)` clause. Types the schema does not
//! know are never collapsed unless the wildcard is configured.
//!
//! ## Determinism
//!
//! Types and versions are emitted in sorted order, so the output depends only
//! on the config's content. Merchants keep their configured order.

use super::entities::ChannelConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tb_01_message_schema::SchemaRegistry;
use tracing::debug;

/// Compiles channel configs into selector expressions.
#[derive(Debug, Clone)]
pub struct SelectorCompiler {
    registry: Arc<SchemaRegistry>,
}

impl SelectorCompiler {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Selector for a channel. Empty when the channel takes every message
    /// from every merchant.
    #[must_use]
    pub fn compile(&self, config: &ChannelConfig) -> String {
        let merchant_clause = merchant_clause(config.merchants());
        let message_clause = self.message_clause(config);

        let selector = match (merchant_clause, message_clause) {
            (Some(merchants), Some(messages)) => format!("{merchants} AND ({messages})"),
            (Some(merchants), None) => merchants,
            (None, Some(messages)) => messages,
            (None, None) => String::new(),
        };

        debug!(channel = %config.id(), selector = %selector, "Selector compiled");
        selector
    }

    fn message_clause(&self, config: &ChannelConfig) -> Option<String> {
        let mut by_type: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for uid in config.messages().keys() {
            by_type
                .entry(uid.message_type.as_str())
                .or_default()
                .insert(uid.version.as_str());
        }

        let mut collapsed = Vec::new();
        let mut disjuncts = Vec::new();
        for (message_type, versions) in &by_type {
            if self.covers_all_versions(message_type, versions) {
                collapsed.push(quote(message_type));
                continue;
            }
            for version in versions {
                disjuncts.push(format!(
                    "(MessageType = {} AND MessageVersion = {})",
                    quote(message_type),
                    quote(version)
                ));
            }
        }

        if !collapsed.is_empty() {
            disjuncts.insert(0, format!("MessageType in ({})", collapsed.join(", ")));
        }

        if disjuncts.is_empty() {
            None
        } else {
            Some(disjuncts.join(" OR "))
        }
    }

    fn covers_all_versions(&self, message_type: &str, configured: &BTreeSet<&str>) -> bool {
        if configured.contains("") {
            return true;
        }
        let known = self.registry.known_versions(message_type);
        !known.is_empty() && known.iter().all(|v| configured.contains(v.as_str()))
    }
}

fn merchant_clause(merchants: &[String]) -> Option<String> {
    if merchants.is_empty() {
        return None;
    }
    let quoted: Vec<String> = merchants.iter().map(|m| quote(m)).collect();
    Some(format!("MerchantID in ({})", quoted.join(", ")))
}

/// Single-quote a literal, doubling embedded quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
