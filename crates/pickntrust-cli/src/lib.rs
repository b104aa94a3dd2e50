//! PickNTrust CLI library.
//!
//! Argument parsing and the command handlers behind the `pickntrust`
//! binary: the API server, the ingestion bot, manual ingestion, database
//! maintenance, backups and channel configuration.

pub mod cli;
pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use pickntrust_core::config;

/// Loads `.env.local` from the state directory, then a local `.env.local`
/// or `.env`. Values already in the environment win.
pub fn load_env_files() {
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}
