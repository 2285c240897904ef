//! Daypage Core Library
//!
//! This library provides the core of a local-first journal: an optional
//! password gate over the journal content and an entry store that keeps
//! one entry per calendar day, plus backup export, import and merge.

pub mod auth;
pub mod backup;
pub mod clock;
pub mod config;
pub mod context;
pub mod crypto;
pub mod journal;
pub mod platform;
pub mod storage;

pub use auth::{AuthGate, LockoutConfig, CURRENT_PASSWORD_VERSION};
pub use backup::{
    decrypt_backup, encrypt_backup, export_backup, is_encrypted_backup, parse_backup,
    read_backup, ImportedEntry,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::JournalConfig;
pub use context::AppContext;
pub use crypto::{CryptoError, PasswordInput};
pub use journal::{merge_imported, EntryStore, JournalEntry, MergeReport};
pub use platform::{get_config_dir, get_data_dir};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageError};

use thiserror::Error;

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// General error type for journal operations
///
/// Expected outcomes such as a wrong password or a corrupt persisted entry
/// are not represented here; they are reported through return values.
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
