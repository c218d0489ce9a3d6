//! # Shared Crypto - Field Encryption Primitives
//!
//! Concrete implementation of the bridge's encryption capability. The
//! transform engine treats it as an opaque `encrypt(text) -> text` /
//! `decrypt(text) -> text` pair; this crate supplies the cipher behind it.
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Field value encryption |
//!
//! Ciphertext travels inside protocol documents as lowercase hex of
//! `nonce || ciphertext`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use symmetric::{decrypt, encrypt, FieldCipher, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
