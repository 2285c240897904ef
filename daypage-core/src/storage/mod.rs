//! Key-value persistence used by the gate and the entry store.
//!
//! The core only assumes synchronous, durable, last-write-wins semantics.
//! Two scopes exist side by side: a durable store that survives restarts and
//! a session store that must not.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Stored password hash (hex)
pub const PASSWORD_HASH_KEY: &str = "passwordHash";
/// Stored password salt (hex)
pub const PASSWORD_SALT_KEY: &str = "passwordSalt";
/// Schema version of the stored credential
pub const PASSWORD_VERSION_KEY: &str = "passwordVersion";
/// JSON array of journal entries
pub const JOURNAL_ENTRIES_KEY: &str = "journalEntries";
/// Currently selected date (`YYYY-MM-DD`)
pub const SELECTED_DATE_KEY: &str = "selectedDate";
/// Epoch milliseconds of the last non-empty save
pub const LAST_TYPED_TIME_KEY: &str = "lastTypedTime";
/// Session-scoped unlock flag
pub const SESSION_UNLOCKED_KEY: &str = "sessionUnlocked";

/// Errors raised by a persistence backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// A synchronous string-keyed store
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several keys as one unit
    ///
    /// Backends that support transactions override this so that readers
    /// never observe a partial write.
    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several keys as one unit
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
