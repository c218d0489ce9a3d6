//! Cross-crate flows: transport → channel worker → transforms → sinks.

pub mod channel_flows;
pub mod fixtures;
pub mod purchase_flows;
