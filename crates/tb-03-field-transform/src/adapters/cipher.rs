//! XChaCha20-Poly1305 field encryption.

use crate::domain::errors::TransformError;
use crate::ports::FieldEncryptor;
use shared_crypto::FieldCipher;

impl FieldEncryptor for FieldCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, TransformError> {
        self.encrypt_text(plaintext)
            .map_err(|e| TransformError::Encryption(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, TransformError> {
        self.decrypt_text(ciphertext)
            .map_err(|e| TransformError::Decryption(e.to_string()))
    }
}
