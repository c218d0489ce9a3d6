//! # ThreeDS Bridge
//!
//! Entry point: initialise logging, load configuration, register the
//! channels found in `TB_CHANNELS_DIR` and run until Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_runtime::{BridgeConfig, BridgeRuntime, DeliveryTargets};
use bridge_telemetry::{init_telemetry, TelemetryConfig};
use shared_bus::InMemoryMessageBus;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialise logging")?;

    let config = BridgeConfig::from_env().context("Invalid bridge configuration")?;
    info!(config = ?config, "Configuration loaded");

    let bus = Arc::new(InMemoryMessageBus::with_capacity(config.bus_capacity));
    let channels_dir = config.channels_dir.clone();
    let runtime = BridgeRuntime::new(config, bus).context("Failed to start bridge runtime")?;

    let targets = DeliveryTargets::logging();
    match channels_dir {
        Some(dir) => {
            runtime
                .load_channels_dir(&dir, &targets)
                .with_context(|| format!("Failed to load channels from {}", dir.display()))?;
        }
        None => warn!("TB_CHANNELS_DIR is not set, no channels registered"),
    }

    runtime.start_sweeper();

    info!(channels = ?runtime.channel_ids(), "Bridge is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
