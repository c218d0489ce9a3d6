//! # Transaction Table
//!
//! The open-transaction table of one purchase channel. Every operation that
//! reads an entry and then decides to flush it runs inside a single `&mut`
//! call, so the owner only has to hold one lock per call for ingest and
//! sweep to stay serialized per transaction.
//!
//! ## Bounds
//!
//! - Entries idle past `max_age` are flushed by `sweep`
//! - The table never holds more than `max_open_transactions`; the oldest
//!   entries are flushed as partial when an ingest exceeds it

use super::config::AggregatorConfig;
use super::transaction::{FlushReason, FlushedTransaction, OpenTransaction};
use shared_types::{Element, Timestamp};
use std::collections::HashMap;

pub struct TransactionTable {
    open: HashMap<String, OpenTransaction>,
    config: AggregatorConfig,
}

impl TransactionTable {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            open: HashMap::new(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AggregatorConfig::default())
    }

    /// Merge `body` into the transaction for `correlation_id`.
    ///
    /// A terminal message removes the transaction and returns it as the
    /// first flushed entry. Any transactions evicted by the table bound
    /// follow it.
    pub fn ingest(
        &mut self,
        correlation_id: &str,
        body: &Element,
        terminal: bool,
        now: Timestamp,
    ) -> Vec<FlushedTransaction> {
        let transaction = self
            .open
            .entry(correlation_id.to_string())
            .or_insert_with(|| OpenTransaction::new(correlation_id, now));
        transaction.absorb(body, now);

        let mut flushed = Vec::new();
        if terminal {
            if let Some(done) = self.open.remove(correlation_id) {
                flushed.push(FlushedTransaction::new(done, FlushReason::Terminal));
            }
            flushed.extend(self.evict_beyond_limit(None));
        } else {
            flushed.extend(self.evict_beyond_limit(Some(correlation_id)));
        }
        flushed
    }

    /// Flush every transaction idle past `max_age`, oldest first.
    pub fn sweep(&mut self, now: Timestamp) -> Vec<FlushedTransaction> {
        let max_age = self.config.max_age_millis();
        let mut expired: Vec<(Timestamp, String)> = self
            .open
            .values()
            .filter(|tx| tx.is_expired(now, max_age))
            .map(|tx| (tx.last_update(), tx.correlation_id().to_string()))
            .collect();
        expired.sort();

        expired
            .into_iter()
            .filter_map(|(_, id)| self.open.remove(&id))
            .map(|tx| FlushedTransaction::new(tx, FlushReason::Expired))
            .collect()
    }

    /// Flush the least recently updated transactions beyond the bound.
    pub fn enforce_max_open(&mut self) -> Vec<FlushedTransaction> {
        self.evict_beyond_limit(None)
    }

    /// `keep` is never a candidate, so the transaction an ingest just
    /// touched survives a tie on `last_update`.
    fn evict_beyond_limit(&mut self, keep: Option<&str>) -> Vec<FlushedTransaction> {
        let limit = self.config.max_open_transactions;
        if self.open.len() <= limit {
            return vec![];
        }

        let mut entries: Vec<(Timestamp, String)> = self
            .open
            .values()
            .filter(|tx| Some(tx.correlation_id()) != keep)
            .map(|tx| (tx.last_update(), tx.correlation_id().to_string()))
            .collect();
        entries.sort();

        let to_remove = self.open.len() - limit;
        entries
            .into_iter()
            .take(to_remove)
            .filter_map(|(_, id)| self.open.remove(&id))
            .map(|tx| FlushedTransaction::new(tx, FlushReason::Evicted))
            .collect()
    }

    /// Drop a transaction without flushing it.
    pub fn remove(&mut self, correlation_id: &str) -> Option<OpenTransaction> {
        self.open.remove(correlation_id)
    }

    pub fn get(&self, correlation_id: &str) -> Option<&OpenTransaction> {
        self.open.get(correlation_id)
    }

    pub fn contains(&self, correlation_id: &str) -> bool {
        self.open.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }
}
