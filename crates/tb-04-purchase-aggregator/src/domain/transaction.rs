//! # Open Transactions
//!
//! One purchase flow in progress. Each ingested message body contributes its
//! immediate children, grouped by tag: a tag seen again replaces the earlier
//! elements of that tag, and tags keep the position of their first
//! appearance.

use shared_types::{Element, Timestamp};

/// Root element name of a flushed transaction document.
pub const TRANSACTION_ROOT: &str = "PurchaseTransaction";

/// Attribute of the root element carrying the correlation id.
pub const TRANSACTION_ID_ATTRIBUTE: &str = "id";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenTransaction {
    correlation_id: String,
    /// (tag, elements) in order of first appearance.
    entries: Vec<(String, Vec<Element>)>,
    first_seen: Timestamp,
    last_update: Timestamp,
}

impl OpenTransaction {
    pub fn new(correlation_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            entries: Vec::new(),
            first_seen: now,
            last_update: now,
        }
    }

    /// Merge a message body into the accumulator (last write wins per tag).
    pub fn absorb(&mut self, body: &Element, now: Timestamp) {
        let mut grouped: Vec<(String, Vec<Element>)> = Vec::new();
        for child in &body.children {
            match grouped.iter_mut().find(|(tag, _)| *tag == child.name) {
                Some((_, elements)) => elements.push(child.clone()),
                None => grouped.push((child.name.clone(), vec![child.clone()])),
            }
        }

        for (tag, elements) in grouped {
            match self.entries.iter_mut().find(|(existing, _)| *existing == tag) {
                Some((_, slot)) => *slot = elements,
                None => self.entries.push((tag, elements)),
            }
        }
        self.last_update = self.last_update.max(now);
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn first_seen(&self) -> Timestamp {
        self.first_seen
    }

    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    /// Accumulated tags in accumulator order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(tag, _)| tag.as_str())
    }

    /// Elements currently held for `tag`.
    pub fn elements(&self, tag: &str) -> Option<&[Element]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == tag)
            .map(|(_, elements)| elements.as_slice())
    }

    /// Idle for longer than `max_age_millis` at `now`.
    pub fn is_expired(&self, now: Timestamp, max_age_millis: u64) -> bool {
        now.saturating_sub(self.last_update) > max_age_millis
    }

    /// Combined document: `<PurchaseTransaction id="...">` wrapping every
    /// accumulated element in accumulator order.
    pub fn into_document(self) -> Element {
        let mut root =
            Element::new(TRANSACTION_ROOT).with_attribute(TRANSACTION_ID_ATTRIBUTE, &self.correlation_id);
        for (_, elements) in self.entries {
            for element in elements {
                root.push_child(element);
            }
        }
        root
    }
}

/// Why a transaction left the open table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// A terminal message arrived.
    Terminal,
    /// Idle past the maximum age.
    Expired,
    /// Pushed out by the table bound.
    Evicted,
}

/// A transaction removed from the open table, ready for its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushedTransaction {
    pub correlation_id: String,
    pub reason: FlushReason,
    pub document: Element,
}

impl FlushedTransaction {
    pub fn new(transaction: OpenTransaction, reason: FlushReason) -> Self {
        Self {
            correlation_id: transaction.correlation_id.clone(),
            reason,
            document: transaction.into_document(),
        }
    }

    /// Completed by a terminal message, as opposed to a partial flush.
    pub fn is_complete(&self) -> bool {
        self.reason == FlushReason::Terminal
    }
}
