//! Shared configuration for PickNTrust.
//!
//! Provides functions to locate the PickNTrust state directory and the files
//! kept inside it.
//!
//! # Storage Structure
//!
//! All application data is stored under `~/.pickntrust/`:
//!
//! ```text
//! ~/.pickntrust/
//! ├── db/           # SQLite database
//! │   └── pickntrust.sqlite
//! ├── config/       # channels.json and .env.local
//! └── backups/      # JSON exports of unified_content
//! ```
//!
//! # Environment Variables
//!
//! - `PICKNTRUST_STATE_DIR`: Override the base state directory
//! - `DATABASE_PATH`: Override the SQLite database file (supports `~`)
//! - `PICKNTRUST_CHANNELS_FILE`: Override the channel configuration file

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "PICKNTRUST_STATE_DIR";

/// Environment variable for a custom database file.
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Environment variable for a custom channel configuration file.
pub const CHANNELS_FILE_ENV: &str = "PICKNTRUST_CHANNELS_FILE";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".pickntrust";

// Subdirectory names
const DB_SUBDIR: &str = "db";
const CONFIG_SUBDIR: &str = "config";
const BACKUPS_SUBDIR: &str = "backups";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the PickNTrust state directory.
///
/// The state directory is determined by:
/// 1. `PICKNTRUST_STATE_DIR` environment variable if set
/// 2. `~/.pickntrust` if home directory is available
/// 3. `.pickntrust` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the database directory.
pub fn db_dir() -> PathBuf {
    state_dir().join(DB_SUBDIR)
}

/// Get the SQLite database path.
///
/// Defaults to `~/.pickntrust/db/pickntrust.sqlite` or `DATABASE_PATH`.
pub fn database_path() -> PathBuf {
    match std::env::var(DATABASE_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            PathBuf::from(shellexpand::tilde(path.trim()).into_owned())
        }
        _ => db_dir().join("pickntrust.sqlite"),
    }
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the backups directory.
pub fn backups_dir() -> PathBuf {
    state_dir().join(BACKUPS_SUBDIR)
}

/// Get the channel configuration file path.
pub fn channels_file() -> PathBuf {
    match std::env::var(CHANNELS_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            PathBuf::from(shellexpand::tilde(path.trim()).into_owned())
        }
        _ => config_dir().join("channels.json"),
    }
}

/// Get the .env.local file path.
///
/// Environment file for secrets (bot token, admin password).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Ensure the state directory and all subdirectories exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(db_dir())?;
    std::fs::create_dir_all(config_dir())?;
    std::fs::create_dir_all(backups_dir())?;
    Ok(())
}
