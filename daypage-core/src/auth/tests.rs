use super::*;
use crate::clock::FixedClock;
use crate::config::JournalConfig;
use crate::storage::MemoryStore;

fn fast_kdf() -> KdfParams {
    KdfParams::with_iterations(1_000)
}

fn context() -> AppContext {
    AppContext::in_memory(Arc::new(FixedClock::new(1_700_000_000_000)))
}

fn new_gate(ctx: &AppContext) -> AuthGate {
    AuthGate::with_kdf_params(ctx, fast_kdf()).unwrap()
}

#[tokio::test]
async fn test_set_then_verify() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    assert!(gate.set_password("correct horse").await.unwrap());
    assert!(gate.has_password());
    assert!(gate.verify_password("correct horse").await.unwrap());
    assert!(!gate.verify_password("correct hors").await.unwrap());
    assert!(!gate.verify_password("Correct horse").await.unwrap());
    assert!(!gate.verify_password("").await.unwrap());
}

#[tokio::test]
async fn test_password_is_trimmed() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    assert!(gate.set_password("  spaced  ").await.unwrap());
    assert!(gate.verify_password("spaced").await.unwrap());
    assert!(gate.verify_password(" spaced\n").await.unwrap());
}

#[tokio::test]
async fn test_empty_password_rejected_without_side_effects() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    assert!(!gate.set_password("").await.unwrap());
    assert!(!gate.set_password("   ").await.unwrap());
    assert!(!gate.has_password());
    assert_eq!(ctx.durable.get(PASSWORD_HASH_KEY).unwrap(), None);

    gate.set_password("first").await.unwrap();
    let salt = ctx.durable.get(PASSWORD_SALT_KEY).unwrap();
    let hash = ctx.durable.get(PASSWORD_HASH_KEY).unwrap();

    assert!(!gate.set_password(" \t ").await.unwrap());
    assert_eq!(ctx.durable.get(PASSWORD_SALT_KEY).unwrap(), salt);
    assert_eq!(ctx.durable.get(PASSWORD_HASH_KEY).unwrap(), hash);
    assert!(gate.verify_password("first").await.unwrap());
}

#[tokio::test]
async fn test_stored_values_are_not_plaintext_and_salt_is_fresh() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    gate.set_password("hunter2").await.unwrap();
    let salt1 = ctx.durable.get(PASSWORD_SALT_KEY).unwrap().unwrap();
    let hash1 = ctx.durable.get(PASSWORD_HASH_KEY).unwrap().unwrap();

    assert_ne!(salt1, "hunter2");
    assert_ne!(hash1, "hunter2");
    assert_eq!(salt1.len(), 32);
    assert_eq!(hash1.len(), 64);

    gate.set_password("hunter2").await.unwrap();
    let salt2 = ctx.durable.get(PASSWORD_SALT_KEY).unwrap().unwrap();
    let hash2 = ctx.durable.get(PASSWORD_HASH_KEY).unwrap().unwrap();

    assert_ne!(salt1, salt2);
    assert_ne!(hash1, hash2);
}

#[tokio::test]
async fn test_verify_without_credential_is_false() {
    let ctx = context();
    let gate = new_gate(&ctx);
    assert!(!gate.verify_password("anything").await.unwrap());
}

#[tokio::test]
async fn test_verify_does_not_unlock() {
    let ctx = context();
    let mut first = new_gate(&ctx);
    first.set_password("pw").await.unwrap();

    let restarted = ctx.restarted();
    let gate = new_gate(&restarted);
    assert!(gate.is_locked());
    assert!(gate.verify_password("pw").await.unwrap());
    assert!(gate.is_locked());
    assert_eq!(restarted.session.get(SESSION_UNLOCKED_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_set_password_does_not_change_lock_state() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    assert!(!gate.is_locked());
    gate.set_password("pw").await.unwrap();
    assert!(!gate.is_locked());
    assert_eq!(ctx.session.get(SESSION_UNLOCKED_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_submit_success_unlocks_and_clears_input() {
    let ctx = context();
    new_gate(&ctx).set_password("open sesame").await.unwrap();

    let restarted = ctx.restarted();
    let mut gate = new_gate(&restarted);
    assert!(gate.is_locked());

    let mut input = PasswordInput::from("open sesame");
    assert!(gate.handle_password_submit(&mut input).await.unwrap());
    assert!(input.is_empty());
    assert!(!gate.is_locked());
    assert_eq!(
        restarted.session.get(SESSION_UNLOCKED_KEY).unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn test_submit_failure_stays_locked_and_clears_input() {
    let ctx = context();
    new_gate(&ctx).set_password("open sesame").await.unwrap();

    let restarted = ctx.restarted();
    let mut gate = new_gate(&restarted);

    let mut input = PasswordInput::from("close sesame");
    assert!(!gate.handle_password_submit(&mut input).await.unwrap());
    assert!(input.is_empty());
    assert!(gate.is_locked());

    // Unlimited attempts by default
    for _ in 0..20 {
        let mut input = PasswordInput::from("nope");
        assert!(!gate.handle_password_submit(&mut input).await.unwrap());
    }
    let mut input = PasswordInput::from("open sesame");
    assert!(gate.handle_password_submit(&mut input).await.unwrap());
}

#[tokio::test]
async fn test_session_flag_is_scoped_to_session() {
    let ctx = context();
    let mut first = new_gate(&ctx);
    first.set_password("pw").await.unwrap();
    first.unlock().unwrap();

    // Same session: a rebuilt gate stays unlocked
    assert!(!new_gate(&ctx).is_locked());

    // New session: locked again
    assert!(new_gate(&ctx.restarted()).is_locked());
}

#[tokio::test]
async fn test_lock_without_password_is_noop() {
    let ctx = context();
    let mut gate = new_gate(&ctx);

    assert!(!gate.lock().unwrap());
    assert!(!gate.is_locked());
}

#[tokio::test]
async fn test_lock_with_password() {
    let ctx = context();
    let mut gate = new_gate(&ctx);
    gate.set_password("pw").await.unwrap();
    gate.unlock().unwrap();

    assert!(gate.lock().unwrap());
    assert!(gate.is_locked());
    assert_eq!(ctx.session.get(SESSION_UNLOCKED_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_remove_password_leaves_unlocked() {
    let ctx = context();
    new_gate(&ctx).set_password("pw").await.unwrap();

    let restarted = ctx.restarted();
    let mut gate = new_gate(&restarted);
    assert!(gate.is_locked());

    gate.remove_password().unwrap();
    assert!(!gate.is_locked());
    assert!(!gate.has_password());
    assert_eq!(restarted.durable.get(PASSWORD_HASH_KEY).unwrap(), None);
    assert_eq!(restarted.durable.get(PASSWORD_SALT_KEY).unwrap(), None);

    // Nothing to lock any more
    assert!(!gate.lock().unwrap());
    assert!(!gate.is_locked());

    // And a fresh session starts open
    assert!(!new_gate(&restarted.restarted()).is_locked());
}

#[tokio::test]
async fn test_change_password_flow() {
    let ctx = context();
    new_gate(&ctx).set_password("old").await.unwrap();

    let restarted = ctx.restarted();
    let mut gate = new_gate(&restarted);
    assert!(gate.is_locked());

    assert!(!gate.change_password("wrong", "new").await.unwrap());
    assert!(gate.verify_password("old").await.unwrap());
    assert!(gate.is_locked());

    assert!(!gate.change_password("old", "   ").await.unwrap());
    assert!(gate.verify_password("old").await.unwrap());

    assert!(gate.change_password("old", "new").await.unwrap());
    assert!(!gate.is_locked());
    assert!(gate.verify_password("new").await.unwrap());
    assert!(!gate.verify_password("old").await.unwrap());
}

#[tokio::test]
async fn test_migration_discards_old_format() {
    let ctx = context();
    ctx.durable.set(PASSWORD_HASH_KEY, "legacyhash").unwrap();
    ctx.durable.set(PASSWORD_SALT_KEY, "legacysalt").unwrap();
    ctx.durable.set(PASSWORD_VERSION_KEY, "1").unwrap();

    let gate = new_gate(&ctx);
    assert!(!gate.has_password());
    assert!(!gate.is_locked());
    assert_eq!(ctx.durable.get(PASSWORD_HASH_KEY).unwrap(), None);
    assert_eq!(ctx.durable.get(PASSWORD_SALT_KEY).unwrap(), None);
    assert_eq!(
        ctx.durable.get(PASSWORD_VERSION_KEY).unwrap(),
        Some(CURRENT_PASSWORD_VERSION.to_string())
    );
}

#[tokio::test]
async fn test_migration_without_version_marker() {
    let store = MemoryStore::new();
    store.set(PASSWORD_HASH_KEY, "legacyhash").unwrap();

    assert!(migrate_credentials(&store).unwrap());
    assert_eq!(store.get(PASSWORD_HASH_KEY).unwrap(), None);

    // Idempotent
    assert!(!migrate_credentials(&store).unwrap());
}

#[tokio::test]
async fn test_migration_keeps_current_format() {
    let ctx = context();
    new_gate(&ctx).set_password("pw").await.unwrap();

    let gate = new_gate(&ctx.restarted());
    assert!(gate.has_password());
    assert!(gate.verify_password("pw").await.unwrap());
}

#[tokio::test]
async fn test_corrupt_salt_fails_verification() {
    let ctx = context();
    let mut gate = new_gate(&ctx);
    gate.set_password("pw").await.unwrap();
    ctx.durable.set(PASSWORD_SALT_KEY, "zz-not-hex").unwrap();

    assert!(!gate.verify_password("pw").await.unwrap());
}

#[tokio::test]
async fn test_optional_lockout() {
    let clock = Arc::new(FixedClock::new(1_700_000_000_000));
    let mut config = JournalConfig::default();
    config.lockout = LockoutConfig::enabled();
    let ctx = AppContext::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        clock.clone(),
        config,
    );

    new_gate(&ctx).set_password("pw").await.unwrap();
    let mut gate = new_gate(&ctx.restarted());

    for _ in 0..DEFAULT_MAX_ATTEMPTS {
        let mut input = PasswordInput::from("wrong");
        assert!(!gate.handle_password_submit(&mut input).await.unwrap());
    }
    assert_eq!(gate.lockout_remaining_seconds(), Some(30));

    // Correct password is refused while locked out, input still cleared
    let mut input = PasswordInput::from("pw");
    assert!(!gate.handle_password_submit(&mut input).await.unwrap());
    assert!(input.is_empty());
    assert!(gate.is_locked());

    clock.advance(31_000);
    assert_eq!(gate.lockout_remaining_seconds(), None);

    let mut input = PasswordInput::from("pw");
    assert!(gate.handle_password_submit(&mut input).await.unwrap());
    assert!(!gate.is_locked());
}

#[tokio::test]
async fn test_huge_lockout_base_is_capped() {
    let mut config = JournalConfig::default();
    config.lockout = LockoutConfig {
        enabled: true,
        max_attempts: 1,
        base_lockout_seconds: 9_000_000_000_000_000_000,
    };
    let ctx = AppContext::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(FixedClock::new(1_700_000_000_000)),
        config,
    );

    new_gate(&ctx).set_password("pw").await.unwrap();
    let mut gate = new_gate(&ctx.restarted());

    let mut input = PasswordInput::from("wrong");
    assert!(!gate.handle_password_submit(&mut input).await.unwrap());
    assert_eq!(
        gate.lockout_remaining_seconds(),
        Some(MAX_BASE_LOCKOUT_SECONDS)
    );
}
