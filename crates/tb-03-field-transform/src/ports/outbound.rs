//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the Field Transform Engine.

use crate::domain::errors::TransformError;

/// Opaque text encryption capability.
///
/// Production: `shared_crypto::FieldCipher` (see `adapters::cipher`)
pub trait FieldEncryptor: Send + Sync {
    /// Encrypt one field value.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Encryption`; the failure is scoped to the
    /// field being encrypted.
    fn encrypt(&self, plaintext: &str) -> Result<String, TransformError>;

    /// Decrypt one field value.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Decryption`; the failure is scoped to the
    /// field being decrypted.
    fn decrypt(&self, ciphertext: &str) -> Result<String, TransformError>;
}
