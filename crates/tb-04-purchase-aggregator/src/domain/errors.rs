use thiserror::Error;

/// Reasons a message or configuration is refused by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregatorError {
    #[error("Message {message_type} has no correlation id")]
    MissingCorrelationId { message_type: String },

    #[error("Message {message_type} for transaction '{correlation_id}' has no body")]
    MissingBody {
        correlation_id: String,
        message_type: String,
    },

    #[error("Invalid aggregator configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a purchase transaction handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Delivery target unavailable: {0}")]
    Unavailable(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}
