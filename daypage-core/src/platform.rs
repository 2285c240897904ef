//! Platform-specific paths

use std::path::PathBuf;

const APP_DIR: &str = "Daypage";
/// File name of the durable store inside the data directory
pub const STORE_FILE: &str = "journal.db";
const CONFIG_FILE: &str = "config.json";

/// Get the platform-specific data directory for storing the journal
///
/// Returns:
/// - Windows: %LOCALAPPDATA%\Daypage
/// - macOS: ~/Library/Application Support/Daypage
/// - Linux/Other: ~/.local/share/Daypage
pub fn get_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".data")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR)
}

/// Get the platform-specific config directory
pub fn get_config_dir() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR)
}

/// Get the default config file path
pub fn get_default_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}
