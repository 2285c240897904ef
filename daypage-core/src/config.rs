//! Journal configuration loaded from `config.json`.

use crate::auth::LockoutConfig;
use crate::platform::{get_data_dir, get_default_config_path, STORE_FILE};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_TIMESTAMP_GAP_MINUTES: i64 = 30;

/// One week
const MAX_TIMESTAMP_GAP_MINUTES: i64 = 7 * 24 * 60;

/// User-tunable settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory holding the durable store
    pub data_dir: PathBuf,

    /// Optional backoff after repeated failed unlocks
    pub lockout: LockoutConfig,

    /// Idle minutes after which the editor inserts a timestamp line
    pub timestamp_gap_minutes: i64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: get_data_dir(),
            lockout: LockoutConfig::default(),
            timestamp_gap_minutes: DEFAULT_TIMESTAMP_GAP_MINUTES,
        }
    }
}

impl JournalConfig {
    /// Load from the default config path, falling back to defaults when the
    /// file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(get_default_config_path())
    }

    /// Load from a specific path, falling back to defaults when the file
    /// does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.normalize();
        Ok(config)
    }

    /// Write to a specific path, creating parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the durable SQLite store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    fn normalize(&mut self) {
        if self.timestamp_gap_minutes < 1 {
            self.timestamp_gap_minutes = DEFAULT_TIMESTAMP_GAP_MINUTES;
        }
        self.timestamp_gap_minutes = self.timestamp_gap_minutes.min(MAX_TIMESTAMP_GAP_MINUTES);
        self.lockout.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MAX_BASE_LOCKOUT_SECONDS;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.timestamp_gap_minutes, 30);
        assert!(!config.lockout.enabled);
        assert!(config.store_path().ends_with("journal.db"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = JournalConfig::load_from(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.timestamp_gap_minutes, 30);
    }

    #[test]
    fn test_partial_file_and_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "timestamp_gap_minutes": 0, "lockout": { "enabled": true, "max_attempts": 0 } }"#,
        )
        .unwrap();

        let config = JournalConfig::load_from(&path).unwrap();
        assert_eq!(config.timestamp_gap_minutes, 30);
        assert!(config.lockout.enabled);
        assert_eq!(config.lockout.max_attempts, 1);
        assert_eq!(config.lockout.base_lockout_seconds, 30);
    }

    #[test]
    fn test_large_timestamp_gap_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "timestamp_gap_minutes": 9223372036854775807 }"#).unwrap();

        let config = JournalConfig::load_from(&path).unwrap();
        assert_eq!(config.timestamp_gap_minutes, MAX_TIMESTAMP_GAP_MINUTES);
    }

    #[test]
    fn test_lockout_base_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{ "lockout": { "base_lockout_seconds": 9000000000000000000 } }"#)
            .unwrap();
        let config = JournalConfig::load_from(&path).unwrap();
        assert_eq!(config.lockout.base_lockout_seconds, MAX_BASE_LOCKOUT_SECONDS);

        std::fs::write(&path, r#"{ "lockout": { "base_lockout_seconds": -5 } }"#).unwrap();
        let config = JournalConfig::load_from(&path).unwrap();
        assert_eq!(config.lockout.base_lockout_seconds, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");

        let mut config = JournalConfig::default();
        config.timestamp_gap_minutes = 45;
        config.save_to(&path).unwrap();

        let loaded = JournalConfig::load_from(&path).unwrap();
        assert_eq!(loaded.timestamp_gap_minutes, 45);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(JournalConfig::load_from(&path).is_err());
    }
}
