//! AES-256-GCM sealing used by the backup envelope.
//!
//! Uses AES-256-GCM with:
//! - 256-bit key
//! - 96-bit (12 byte) random nonce, prepended to the output
//! - 128-bit authentication tag, appended by the cipher

use crate::crypto::{CryptoError, Result};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use zeroize::ZeroizeOnDrop;

/// Nonce length in bytes
pub const NONCE_LENGTH: usize = 12;

/// Tag length in bytes
pub const TAG_LENGTH: usize = 16;

/// A 256-bit key for sealing and opening blobs
#[derive(Clone, ZeroizeOnDrop)]
pub struct SealingKey {
    key: [u8; 32],
}

impl SealingKey {
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get the raw key bytes (use sparingly)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Encrypt `plaintext`, returning `nonce ‖ ciphertext ‖ tag`
pub fn seal(key: &SealingKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("{}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt the output of [`seal`]
///
/// Returns [`CryptoError::AuthenticationFailed`] when the tag does not
/// verify, which covers both tampering and a wrong key.
pub fn open(key: &SealingKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed(format!(
            "Sealed data too short: {} bytes",
            sealed.len()
        )));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
