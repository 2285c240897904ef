//! PBKDF2 key derivation for the password gate.
//!
//! Uses PBKDF2-HMAC-SHA256 with:
//! - Iterations: 100,000
//! - Output length: 32 bytes (256 bits), hex encoded
//! - Salt length: 16 bytes, hex encoded, fresh for every password set

use crate::crypto::{CryptoError, Result};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Iteration count for stored credentials
///
/// Changing it invalidates every stored hash, so it is tied to the
/// credential schema version rather than to user configuration.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Output length in bytes
pub const OUTPUT_LENGTH: usize = 32;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of HMAC iterations
    pub iterations: u32,

    /// Output length in bytes
    pub output_length: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            output_length: OUTPUT_LENGTH,
        }
    }
}

impl KdfParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheaper parameters for tests; never use for stored credentials
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Verify that parameters are within acceptable ranges
    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1_000 {
            return Err(CryptoError::KdfFailed(
                "Iteration count too low (minimum: 1000)".to_string(),
            ));
        }
        if self.output_length < 32 {
            return Err(CryptoError::KdfFailed(
                "Output length too short (minimum: 32 bytes)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a fresh random salt, hex encoded
pub fn generate_salt() -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    hex::encode(salt)
}

/// Derive the hex-encoded password verifier for `password` under `salt_hex`
pub fn derive_password_hash(password: &[u8], salt_hex: &str, params: &KdfParams) -> Result<String> {
    params.validate()?;

    let salt = hex::decode(salt_hex).map_err(|e| CryptoError::InvalidSalt(e.to_string()))?;
    if salt.is_empty() {
        return Err(CryptoError::InvalidSalt("Salt is empty".to_string()));
    }

    let mut key = Zeroizing::new(vec![0u8; params.output_length]);
    pbkdf2_hmac::<Sha256>(password, &salt, params.iterations, &mut key);

    Ok(hex::encode(key.as_slice()))
}

/// Derive a raw 256-bit key from a passphrase and raw salt bytes
pub fn derive_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> [u8; OUTPUT_LENGTH] {
    let mut key = [0u8; OUTPUT_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key);
    key
}

/// Derive the verifier on the blocking pool so the caller's task yields
/// while the iterations run
pub async fn derive_password_hash_async(
    password: Zeroizing<Vec<u8>>,
    salt_hex: String,
    params: KdfParams,
) -> Result<String> {
    tokio::task::spawn_blocking(move || derive_password_hash(&password, &salt_hex, &params))
        .await
        .map_err(|e| CryptoError::KdfFailed(format!("Derivation task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::with_iterations(1_000)
    }

    #[test]
    fn test_kdf_params_default() {
        let params = KdfParams::default();
        assert_eq!(params.iterations, 100_000);
        assert_eq!(params.output_length, 32);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_kdf_params_validation() {
        let mut params = KdfParams::default();

        params.iterations = 10;
        assert!(params.validate().is_err());

        params.iterations = 100_000;
        params.output_length = 16;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_eq!(salt1.len(), SALT_LENGTH * 2);
        assert!(salt1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_derive_password_hash() {
        let salt = generate_salt();

        let hash1 = derive_password_hash(b"correct horse", &salt, &fast()).unwrap();
        let hash2 = derive_password_hash(b"correct horse", &salt, &fast()).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), OUTPUT_LENGTH * 2);

        let hash3 = derive_password_hash(b"battery staple", &salt, &fast()).unwrap();
        assert_ne!(hash1, hash3);

        let other_salt = generate_salt();
        let hash4 = derive_password_hash(b"correct horse", &other_salt, &fast()).unwrap();
        assert_ne!(hash1, hash4);
    }

    #[test]
    fn test_known_vector() {
        // RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector, truncated to 32 bytes
        let params = KdfParams {
            iterations: 80_000,
            output_length: 32,
        };
        let salt = hex::encode(b"NaCl");
        let hash = derive_password_hash(b"Password", &salt, &params).unwrap();
        assert_eq!(
            hash,
            "4ddcd8f60b98be21830cee5ef22701f9641a4418d04c0414aeff08876b34ab56"
        );
    }

    #[test]
    fn test_derive_key_matches_hash() {
        let salt = generate_salt();
        let raw = derive_key(b"pw", &hex::decode(&salt).unwrap(), 1_000);
        let hashed = derive_password_hash(b"pw", &salt, &fast()).unwrap();
        assert_eq!(hex::encode(raw), hashed);
    }

    #[test]
    fn test_invalid_salt_rejected() {
        assert!(matches!(
            derive_password_hash(b"pw", "not-hex", &fast()),
            Err(CryptoError::InvalidSalt(_))
        ));
        assert!(matches!(
            derive_password_hash(b"pw", "", &fast()),
            Err(CryptoError::InvalidSalt(_))
        ));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let salt = generate_salt();
        let expected = derive_password_hash(b"pw", &salt, &fast()).unwrap();
        let actual =
            derive_password_hash_async(Zeroizing::new(b"pw".to_vec()), salt, fast())
                .await
                .unwrap();
        assert_eq!(expected, actual);
    }
}
