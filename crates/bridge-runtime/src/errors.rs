use shared_bus::SelectorError;
use tb_01_message_schema::SchemaError;
use tb_02_channel_filter::ChannelConfigError;
use tb_04_purchase_aggregator::AggregatorError;
use thiserror::Error;

/// Errors from channel registration and reconfiguration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Channel configuration error: {0}")]
    Channel(#[from] ChannelConfigError),

    #[error("Transport rejected selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("Aggregator error: {0}")]
    Aggregator(#[from] AggregatorError),

    #[error("Channel '{0}' is already registered")]
    DuplicateChannel(String),

    #[error("Channel '{0}' is not registered")]
    UnknownChannel(String),

    #[error("Failed to read channel directory: {0}")]
    Io(#[from] std::io::Error),
}
