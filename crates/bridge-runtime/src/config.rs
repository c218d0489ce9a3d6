//! # Bridge Configuration
//!
//! Defaults for every setting, overridden from `TB_*` environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TB_SCHEMA_PATH` | bundled 3-D Secure schema | Schema source JSON |
//! | `TB_CHANNELS_DIR` | none | Directory of channel config JSON files |
//! | `TB_SWEEP_INTERVAL_SECS` | `86400` | Purchase sweep period |
//! | `TB_MAX_TRANSACTION_AGE_SECS` | `86400` | Idle age before a partial flush |
//! | `TB_MAX_OPEN_TRANSACTIONS` | `10000` | Open transactions per purchase channel |
//! | `TB_CIPHER_KEY` | random per process | 64 hex chars, field encryption key |
//! | `TB_DISPLAY_ZONE` | `UTC` | Zone for date masks (`UTC` or `NAME±HH:MM`) |
//! | `TB_CURRENCY_SYMBOL` | `$` | Symbol for `¤` in number masks |
//! | `TB_BUS_CAPACITY` | `1000` | Per-subscriber transport buffer |

use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_crypto::SecretKey;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tb_03_field_transform::{DisplayZone, MaskContext};
use tb_04_purchase_aggregator::AggregatorConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}='{value}' is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The key itself is never echoed.
    #[error("TB_CIPHER_KEY is invalid: {0}")]
    InvalidCipherKey(String),
}

/// Complete bridge configuration.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Schema source; the bundled schema when unset.
    pub schema_path: Option<PathBuf>,
    /// Channel configs loaded at startup.
    pub channels_dir: Option<PathBuf>,
    /// Purchase aggregation settings shared by every purchase channel.
    pub aggregator: AggregatorConfig,
    /// Field encryption key. A random key is generated when unset, so
    /// ciphertext does not survive a restart.
    pub cipher_key: Option<SecretKey>,
    /// Zone and currency symbol for mask rendering.
    pub mask: MaskContext,
    /// Per-subscriber transport buffer.
    pub bus_capacity: usize,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("schema_path", &self.schema_path)
            .field("channels_dir", &self.channels_dir)
            .field("aggregator", &self.aggregator)
            .field("cipher_key", &self.cipher_key.as_ref().map(|_| "<redacted>"))
            .field("mask", &self.mask)
            .field("bus_capacity", &self.bus_capacity)
            .finish()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            channels_dir: None,
            aggregator: AggregatorConfig::default(),
            cipher_key: None,
            mask: MaskContext::default(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any variable that is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for any variable that is set but does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("TB_SCHEMA_PATH") {
            config.schema_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = var("TB_CHANNELS_DIR") {
            config.channels_dir = Some(PathBuf::from(dir));
        }

        if let Some(value) = var("TB_SWEEP_INTERVAL_SECS") {
            config.aggregator.sweep_interval =
                Duration::from_secs(parse_positive("TB_SWEEP_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = var("TB_MAX_TRANSACTION_AGE_SECS") {
            config.aggregator.max_age =
                Duration::from_secs(parse_number("TB_MAX_TRANSACTION_AGE_SECS", &value)?);
        }
        if let Some(value) = var("TB_MAX_OPEN_TRANSACTIONS") {
            config.aggregator.max_open_transactions =
                usize_from(parse_positive("TB_MAX_OPEN_TRANSACTIONS", &value)?);
        }
        if let Some(value) = var("TB_BUS_CAPACITY") {
            config.bus_capacity = usize_from(parse_positive("TB_BUS_CAPACITY", &value)?);
        }

        if let Some(hex_key) = var("TB_CIPHER_KEY") {
            let key = SecretKey::from_hex(&hex_key)
                .map_err(|e| ConfigError::InvalidCipherKey(e.to_string()))?;
            config.cipher_key = Some(key);
        }

        if let Some(value) = var("TB_DISPLAY_ZONE") {
            config.mask.zone = value.parse::<DisplayZone>().map_err(|e| ConfigError::InvalidValue {
                var: "TB_DISPLAY_ZONE",
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(symbol) = lookup("TB_CURRENCY_SYMBOL") {
            config.mask.currency_symbol = symbol;
        }

        Ok(config)
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse_number(var, value)? {
        0 => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        n => Ok(n),
    }
}

fn usize_from(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
