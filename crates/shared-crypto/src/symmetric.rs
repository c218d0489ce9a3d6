//! # Symmetric Encryption
//!
//! XChaCha20-Poly1305 encryption of individual field values.
//!
//! ## Security Properties
//!
//! - 192-bit random nonce per value, so repeated plaintexts never produce
//!   repeated ciphertexts
//! - Poly1305 tag: tampered ciphertext fails to decrypt instead of yielding
//!   garbage

use crate::CryptoError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidInput` for non-hex input and
    /// `CryptoError::InvalidKeyLength` for keys that are not 32 bytes.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let mut bytes =
            hex::decode(hex_key.trim()).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            let actual = bytes.len();
            bytes.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual,
            });
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(key))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Nonce for encryption.
#[derive(Clone)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Encrypt plaintext with XChaCha20-Poly1305.
///
/// Returns (ciphertext, nonce).
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext with XChaCha20-Poly1305.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption fails.
pub fn decrypt(key: &SecretKey, ciphertext: &[u8], nonce: &Nonce) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Text-in, text-out cipher for document field values.
///
/// Output format: lowercase hex of `nonce || ciphertext`.
#[derive(Clone)]
pub struct FieldCipher {
    key: SecretKey,
}

impl FieldCipher {
    /// Create a cipher around an existing key.
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Encrypt a field value.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if the AEAD rejects the input.
    pub fn encrypt_text(&self, plaintext: &str) -> Result<String, CryptoError> {
        let (ciphertext, nonce) = encrypt(&self.key, plaintext.as_bytes())?;
        let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(nonce.as_bytes());
        framed.extend_from_slice(&ciphertext);
        Ok(hex::encode(framed))
    }

    /// Decrypt a value produced by [`FieldCipher::encrypt_text`].
    ///
    /// # Errors
    ///
    /// - `CryptoError::MalformedCiphertext` - not hex, or shorter than a nonce
    /// - `CryptoError::DecryptionFailed` - wrong key or tampered value
    pub fn decrypt_text(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let framed =
            hex::decode(ciphertext.trim()).map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
        if framed.len() < NONCE_LEN {
            return Err(CryptoError::MalformedCiphertext(format!(
                "{} bytes is shorter than a nonce",
                framed.len()
            )));
        }

        let (nonce_bytes, body) = framed.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        let plaintext = decrypt(&self.key, body, &Nonce::from_bytes(nonce))?;
        String::from_utf8(plaintext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}
