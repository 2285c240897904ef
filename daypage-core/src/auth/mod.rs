//! Password gate over the journal content.
//!
//! The password itself is never stored. Setting a password stores a fresh
//! random salt and the PBKDF2 verifier derived from the trimmed password;
//! verification re-derives and compares in constant time. Whether the
//! current run has passed the gate lives in the session store only.

mod lockout;
#[cfg(test)]
mod tests;

pub use lockout::{AttemptTracker, LockoutConfig, DEFAULT_MAX_ATTEMPTS, MAX_BASE_LOCKOUT_SECONDS};

use crate::{
    clock::Clock,
    context::AppContext,
    crypto::{
        derive_password_hash_async, generate_salt, timing_safe_eq, CryptoError, KdfParams,
        PasswordInput,
    },
    storage::{
        KeyValueStore, PASSWORD_HASH_KEY, PASSWORD_SALT_KEY, PASSWORD_VERSION_KEY,
        SESSION_UNLOCKED_KEY,
    },
    Result,
};
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Schema version of the stored credential format
///
/// Credentials stamped with any other version are discarded on startup.
pub const CURRENT_PASSWORD_VERSION: u32 = 2;

const UNLOCKED: &str = "true";

/// Gate state for one run of the application
pub struct AuthGate {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    kdf_params: KdfParams,
    attempts: AttemptTracker,
    has_password: bool,
    is_locked: bool,
}

impl AuthGate {
    /// Build the gate, migrating old credentials first
    ///
    /// The gate starts locked when a credential exists and this session has
    /// not yet been unlocked.
    pub fn new(ctx: &AppContext) -> Result<Self> {
        Self::with_kdf_params(ctx, KdfParams::default())
    }

    /// Build the gate with explicit KDF parameters
    pub fn with_kdf_params(ctx: &AppContext, kdf_params: KdfParams) -> Result<Self> {
        migrate_credentials(ctx.durable.as_ref())?;

        let has_password = stored_credential(ctx.durable.as_ref())?.is_some();
        let session_unlocked =
            ctx.session.get(SESSION_UNLOCKED_KEY)?.as_deref() == Some(UNLOCKED);

        Ok(Self {
            durable: Arc::clone(&ctx.durable),
            session: Arc::clone(&ctx.session),
            clock: Arc::clone(&ctx.clock),
            kdf_params,
            attempts: AttemptTracker::new(ctx.config.lockout.clone()),
            has_password,
            is_locked: has_password && !session_unlocked,
        })
    }

    /// Whether a credential is stored
    pub fn has_password(&self) -> bool {
        self.has_password
    }

    /// Whether the journal content is currently hidden behind the gate
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    /// Store a new credential for `new_password`
    ///
    /// Returns `false` without touching storage when the trimmed password is
    /// empty. Does not change the lock state.
    pub async fn set_password(&mut self, new_password: &str) -> Result<bool> {
        let trimmed = Zeroizing::new(new_password.trim().as_bytes().to_vec());
        if trimmed.is_empty() {
            return Ok(false);
        }

        let salt = generate_salt();
        let hash = derive_password_hash_async(trimmed, salt.clone(), self.kdf_params).await?;

        self.durable
            .set_many(&[(PASSWORD_SALT_KEY, salt.as_str()), (PASSWORD_HASH_KEY, hash.as_str())])?;
        self.has_password = true;

        info!("Password set");
        Ok(true)
    }

    /// Check `candidate` against the stored credential without changing any
    /// state
    pub async fn verify_password(&self, candidate: &str) -> Result<bool> {
        let candidate = Zeroizing::new(candidate.trim().as_bytes().to_vec());
        self.verify_bytes(candidate).await
    }

    /// Submit the prompt contents
    ///
    /// On success the session is marked unlocked. The input buffer is
    /// cleared either way.
    pub async fn handle_password_submit(&mut self, input: &mut PasswordInput) -> Result<bool> {
        let now = self.clock.now_millis();
        if let Some(remaining) = self.attempts.remaining_lockout_millis(now) {
            input.clear();
            warn!(
                "Unlock attempt rejected, locked out for {}s",
                (remaining + 999) / 1000
            );
            return Ok(false);
        }

        let candidate = input.trimmed_bytes();
        input.clear();

        if self.verify_bytes(candidate).await? {
            self.attempts.clear();
            self.unlock()?;
            Ok(true)
        } else {
            self.attempts.record_failure(now);
            warn!(
                "Unlock attempt failed ({} consecutive)",
                self.attempts.failed_attempts()
            );
            Ok(false)
        }
    }

    /// Replace the credential after checking the old password
    ///
    /// The session ends up unlocked so the user is not asked for the
    /// password they just chose.
    pub async fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<bool> {
        if new_password.trim().is_empty() {
            return Ok(false);
        }
        if self.has_password && !self.verify_password(old_password).await? {
            return Ok(false);
        }
        if !self.set_password(new_password).await? {
            return Ok(false);
        }
        self.unlock()?;
        Ok(true)
    }

    /// Delete the credential; the gate stays open until a new one is set
    pub fn remove_password(&mut self) -> Result<()> {
        self.durable
            .remove_many(&[PASSWORD_HASH_KEY, PASSWORD_SALT_KEY])?;
        self.has_password = false;
        self.attempts.clear();
        self.unlock()?;

        info!("Password removed");
        Ok(())
    }

    /// Lock the session
    ///
    /// Returns `false` and leaves the gate open when no password is set.
    pub fn lock(&mut self) -> Result<bool> {
        if !self.has_password {
            return Ok(false);
        }

        self.session.remove(SESSION_UNLOCKED_KEY)?;
        self.is_locked = true;

        info!("Journal locked");
        Ok(true)
    }

    /// Mark the session unlocked without verification
    pub fn unlock(&mut self) -> Result<()> {
        self.session.set(SESSION_UNLOCKED_KEY, UNLOCKED)?;
        self.is_locked = false;
        Ok(())
    }

    /// Seconds until another submit is accepted, when locked out
    pub fn lockout_remaining_seconds(&self) -> Option<i64> {
        self.attempts
            .remaining_lockout_millis(self.clock.now_millis())
            .map(|ms| (ms + 999) / 1000)
    }

    async fn verify_bytes(&self, candidate: Zeroizing<Vec<u8>>) -> Result<bool> {
        let Some((salt, expected)) = stored_credential(self.durable.as_ref())? else {
            return Ok(false);
        };

        let derived = match derive_password_hash_async(candidate, salt, self.kdf_params).await {
            Ok(hash) => hash,
            Err(CryptoError::InvalidSalt(e)) => {
                warn!("Stored salt is unreadable: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(timing_safe_eq(&derived, &expected))
    }
}

/// Read `(salt, hash)` when both are present
fn stored_credential(store: &dyn KeyValueStore) -> Result<Option<(String, String)>> {
    let salt = store.get(PASSWORD_SALT_KEY)?;
    let hash = store.get(PASSWORD_HASH_KEY)?;
    match (salt, hash) {
        (Some(salt), Some(hash)) if !salt.is_empty() && !hash.is_empty() => Ok(Some((salt, hash))),
        _ => Ok(None),
    }
}

/// Discard credentials stored under any other format version
///
/// Forward-only and idempotent: old hashes are never reinterpreted, only
/// removed, and the current version is stamped. Returns whether anything
/// changed.
pub fn migrate_credentials(store: &dyn KeyValueStore) -> Result<bool> {
    let stored_version = store
        .get(PASSWORD_VERSION_KEY)?
        .and_then(|v| v.trim().parse::<u32>().ok());

    if stored_version == Some(CURRENT_PASSWORD_VERSION) {
        return Ok(false);
    }

    let had_credential = store.get(PASSWORD_HASH_KEY)?.is_some();
    store.remove_many(&[PASSWORD_HASH_KEY, PASSWORD_SALT_KEY])?;
    store.set(PASSWORD_VERSION_KEY, &CURRENT_PASSWORD_VERSION.to_string())?;

    if had_credential {
        info!(
            "Discarded credential from format {:?}; a new password must be set",
            stored_version
        );
    } else {
        info!("Stamped credential format {}", CURRENT_PASSWORD_VERSION);
    }
    Ok(true)
}
