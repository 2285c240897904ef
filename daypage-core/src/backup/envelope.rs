//! Encrypted backup envelope.
//!
//! ```text
//! DAYPAGE ENCRYPTED BACKUP v1
//!
//! base64(nonce ‖ ciphertext ‖ tag)
//! ```
//!
//! The key is derived from a passphrase compiled into the application, so
//! anyone holding the application can open an envelope. This is
//! obfuscation against casual inspection of an exported file, not
//! encryption against an attacker. Changing the passphrase or the salt
//! makes every existing envelope unreadable.

use crate::{
    crypto::{derive_key, open, seal, CryptoError, SealingKey},
    Result,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::OnceLock;
use tracing::debug;

/// First line of every envelope
pub const ENVELOPE_HEADER: &str = "DAYPAGE ENCRYPTED BACKUP v1";

const EMBEDDED_PASSPHRASE: &[u8] = b"daypage-local-backup-envelope";
const ENVELOPE_SALT: &[u8] = b"daypage-envelope-salt-v1";
const ENVELOPE_ITERATIONS: u32 = 100_000;

fn envelope_key() -> &'static SealingKey {
    static KEY: OnceLock<SealingKey> = OnceLock::new();
    KEY.get_or_init(|| {
        SealingKey::from_bytes(derive_key(
            EMBEDDED_PASSPHRASE,
            ENVELOPE_SALT,
            ENVELOPE_ITERATIONS,
        ))
    })
}

/// Wrap a backup document in the envelope
pub fn encrypt_backup(text: &str) -> Result<String> {
    let sealed = seal(envelope_key(), text.as_bytes())?;
    Ok(format!("{}\n\n{}\n", ENVELOPE_HEADER, BASE64.encode(sealed)))
}

/// Whether `document` starts with the envelope header
pub fn is_encrypted_backup(document: &str) -> bool {
    document.trim_start().starts_with(ENVELOPE_HEADER)
}

/// Unwrap an envelope produced by [`encrypt_backup`]
pub fn decrypt_backup(document: &str) -> Result<String> {
    let body = document
        .trim_start()
        .strip_prefix(ENVELOPE_HEADER)
        .ok_or_else(|| CryptoError::DecryptionFailed("Missing envelope header".to_string()))?;

    let encoded: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let sealed = BASE64
        .decode(encoded)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Invalid base64: {}", e)))?;

    let plaintext = open(envelope_key(), &sealed)?;
    let text = String::from_utf8(plaintext)
        .map_err(|_| CryptoError::DecryptionFailed("Backup is not valid UTF-8".to_string()))?;

    debug!("Opened encrypted backup ({} bytes)", text.len());
    Ok(text)
}
