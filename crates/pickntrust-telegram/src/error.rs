//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the ingestion bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set MASTER_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Webhook registration failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),

    /// Webhook mode needs a public URL to register.
    #[error("PUBLIC_BASE_URL not set; webhook mode needs a public URL")]
    NoPublicUrl,

    /// Bot API call failed.
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),

    /// Downloading a file from Telegram failed.
    #[error("Download error: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// Persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] pickntrust_store::StoreError),

    /// Link resolution or scraping failed.
    #[error("Link error: {0}")]
    Link(#[from] pickntrust_links::LinkError),

    /// Channel configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] pickntrust_core::ConfigError),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;
