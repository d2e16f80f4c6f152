//! Default paths for curfew components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/curfew/config.json` or `~/.config/curfew/config.json`
//! - Logs: `$XDG_STATE_HOME/curfew/curfew.log` or `~/.local/state/curfew/curfew.log`

use std::path::PathBuf;

/// Environment variable for overriding the configuration file path
pub const CURFEW_CONFIG_ENV: &str = "CURFEW_CONFIG";

/// Environment variable for a remote configuration URL
pub const CURFEW_CONFIG_URL_ENV: &str = "CURFEW_CONFIG_URL";

/// Application subdirectory name
const APP_DIR: &str = "curfew";

const CONFIG_FILENAME: &str = "config.json";

const LOG_FILENAME: &str = "curfew.log";

/// Get the default configuration file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/curfew/config.json` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/curfew/config.json` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    // Last resort
    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default log directory.
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/curfew` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/curfew` (fallback)
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}

/// Get the default log file (inside [`default_log_dir`])
pub fn default_log_file() -> PathBuf {
    default_log_dir().join(LOG_FILENAME)
}
