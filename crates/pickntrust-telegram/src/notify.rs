//! Admin alerts.
//!
//! Alerts are HTML formatted and go to the configured alert chat. Without
//! one they are only logged.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html::escape;
use tracing::{info, warn};

/// Delivers admin alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an HTML formatted alert. Delivery failures are logged, not returned.
    async fn alert(&self, html: &str);
}

/// Sends alerts to a Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }

    /// Creates a notifier with its own bot handle.
    pub fn from_token(token: &str, chat_id: i64) -> Self {
        Self::new(Bot::new(token), chat_id)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn alert(&self, html: &str) {
        let result = self
            .bot
            .send_message(self.chat_id, html)
            .parse_mode(ParseMode::Html)
            .await;
        if let Err(e) = result {
            warn!(chat_id = %self.chat_id, error = %e, "Failed to send admin alert");
        }
    }
}

/// Logs alerts when no alert chat is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn alert(&self, html: &str) {
        info!(alert = %html, "Admin alert (no alert chat configured)");
    }
}

/// Alert for a post that could not be stored.
pub fn save_failed_alert(page_name: &str, chat_id: i64, message_id: i64, error: &str) -> String {
    format!(
        "❌ <b>Channel Post Save Failed</b>\n\
         • Channel: <code>{}</code> ({})\n\
         • Message ID: <code>{}</code>\n\
         • Error: <code>{}</code>",
        escape(page_name),
        chat_id,
        message_id,
        escape(error),
    )
}

/// Alert for a post whose processing failed.
pub fn processing_failed_alert(page_name: &str, chat_id: i64, message_id: i64, error: &str) -> String {
    format!(
        "❌ <b>Processing Failed</b>\n\
         • Channel: <code>{}</code> ({})\n\
         • Message ID: <code>{}</code>\n\
         • Error: <code>{}</code>",
        escape(page_name),
        chat_id,
        message_id,
        escape(error),
    )
}

/// Alert sent once the bot is up.
pub fn started_alert(username: &str, mode: &str, channels: usize) -> String {
    format!(
        "✅ <b>Bot Initialized</b>\n\
         • Bot: <code>{}</code>\n\
         • Mode: {}\n\
         • Channels: {}",
        escape(username),
        escape(mode),
        channels,
    )
}
