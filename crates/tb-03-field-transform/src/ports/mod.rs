//! # Ports
//!
//! - `outbound` - the encryption capability

pub mod outbound;

pub use outbound::FieldEncryptor;
