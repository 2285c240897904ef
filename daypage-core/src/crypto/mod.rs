//! Cryptographic primitives for the journal.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password hashing
//! - Timing-safe comparison of stored verifiers
//! - AES-256-GCM sealing for the backup envelope
//! - A zeroizing password input buffer

pub mod cipher;
pub mod compare;
pub mod kdf;
pub mod zero;

pub use cipher::{open, seal, SealingKey};
pub use compare::timing_safe_eq;
pub use kdf::{
    derive_key, derive_password_hash, derive_password_hash_async, generate_salt, KdfParams,
};
pub use zero::PasswordInput;

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KdfFailed(String),

    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Authentication failed - data may have been tampered with")]
    AuthenticationFailed,
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;
