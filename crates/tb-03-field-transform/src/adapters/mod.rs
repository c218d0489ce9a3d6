//! # Adapters
//!
//! - `cipher` - `FieldEncryptor` over `shared_crypto::FieldCipher`
//! - `validator` - mask syntax check for channel validation

pub mod cipher;
pub mod validator;

pub use validator::MaskTemplateValidator;
