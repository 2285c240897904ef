//! Application context shared by the gate and the entry store.

use crate::clock::{Clock, SystemClock};
use crate::config::JournalConfig;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::Result;
use std::sync::Arc;

/// Handles to everything the core needs from its surroundings
///
/// Cloning is cheap; clones share the same stores and clock.
#[derive(Clone)]
pub struct AppContext {
    /// Survives restarts
    pub durable: Arc<dyn KeyValueStore>,
    /// Dies with the process
    pub session: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub config: JournalConfig,
}

impl AppContext {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: JournalConfig,
    ) -> Self {
        Self {
            durable,
            session,
            clock,
            config,
        }
    }

    /// Open the SQLite store named by `config` with a fresh session scope
    pub fn open(config: JournalConfig) -> Result<Self> {
        let durable = SqliteStore::open(config.store_path())?;
        Ok(Self::new(
            Arc::new(durable),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            config,
        ))
    }

    /// Both scopes in memory
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            clock,
            JournalConfig::default(),
        )
    }

    /// A context for a restarted process: same durable store and clock,
    /// empty session scope
    pub fn restarted(&self) -> Self {
        Self {
            session: Arc::new(MemoryStore::new()),
            ..self.clone()
        }
    }
}
