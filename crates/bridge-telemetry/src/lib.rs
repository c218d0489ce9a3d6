//! # Bridge Telemetry
//!
//! Structured logging for the bridge processes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TB_SERVICE_NAME` | `threeds-bridge` | Service name attached to startup log |
//! | `TB_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `TB_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `TB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_telemetry;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Log a channel-scoped event with the standard `channel` field.
#[macro_export]
macro_rules! log_channel_event {
    ($level:ident, $channel:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            channel = %$channel,
            $($($field)*,)?
            $msg
        )
    };
}
