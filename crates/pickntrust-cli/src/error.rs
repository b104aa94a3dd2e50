//! Error types for the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] pickntrust_store::StoreError),

    #[error(transparent)]
    Telegram(#[from] pickntrust_telegram::TelegramError),

    #[error(transparent)]
    Config(#[from] pickntrust_core::ConfigError),

    #[error(transparent)]
    Link(#[from] pickntrust_links::LinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Refusing to overwrite a file.
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CliError>;
