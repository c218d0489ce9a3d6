//! # Ports
//!
//! - `outbound` - capabilities the channel filter needs from other subsystems

pub mod outbound;

pub use outbound::TemplateValidator;
