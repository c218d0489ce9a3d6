//! # Aggregator Configuration
//!
//! - `sweep_interval`: how often stale transactions are flushed (default: 24h)
//! - `max_age`: idle time after which an open transaction is stale (default: 24h)
//! - `max_open_transactions`: table bound; the oldest entries are flushed as
//!   partial once it is exceeded (default: 10 000)

use super::errors::AggregatorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default idle time before an open transaction is flushed as partial.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default bound on open transactions per channel.
pub const DEFAULT_MAX_OPEN_TRANSACTIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Period of the shared sweep timer.
    pub sweep_interval: Duration,
    /// Age, measured from the last update, past which a transaction is stale.
    pub max_age: Duration,
    /// Maximum number of open transactions held at once.
    pub max_open_transactions: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            max_age: DEFAULT_MAX_AGE,
            max_open_transactions: DEFAULT_MAX_OPEN_TRANSACTIONS,
        }
    }
}

impl AggregatorConfig {
    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AggregatorError::InvalidConfig` for a zero sweep interval or
    /// a zero table bound.
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.sweep_interval.is_zero() {
            return Err(AggregatorError::InvalidConfig(
                "sweep_interval must be non-zero".to_string(),
            ));
        }
        if self.max_open_transactions == 0 {
            return Err(AggregatorError::InvalidConfig(
                "max_open_transactions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `max_age` in timestamp units (milliseconds).
    pub fn max_age_millis(&self) -> u64 {
        u64::try_from(self.max_age.as_millis()).unwrap_or(u64::MAX)
    }
}
