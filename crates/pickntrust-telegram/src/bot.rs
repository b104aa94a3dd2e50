//! Main Telegram bot implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use futures::future::{BoxFuture, FutureExt};
use pickntrust_core::Settings;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, TelegramError};
use crate::handlers::{handle_command, handle_post, Command};
use crate::notify::{started_alert, Notifier, TelegramNotifier};
use crate::state::BotState;

/// Path Telegram posts webhook updates to.
pub const WEBHOOK_PATH: &str = "/webhook/master";

/// The master ingestion bot.
pub struct TelegramBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl TelegramBot {
    /// Creates a bot with the given token.
    pub fn new(token: impl Into<String>, state: Arc<BotState>) -> Self {
        Self {
            bot: Bot::new(token),
            state,
        }
    }

    /// Creates a bot from `MASTER_BOT_TOKEN`.
    pub fn from_settings(settings: &Settings, state: Arc<BotState>) -> Result<Self> {
        let token = settings.bot_token.as_deref().ok_or(TelegramError::NoToken)?;
        Ok(Self::new(token, state))
    }

    /// Returns a handle to the teloxide bot.
    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Registers commands and tells the alert chat the bot is up.
    async fn announce(&self, mode: &str) {
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to register bot commands");
        }

        let username = match self.get_me().await {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "Failed to get bot info");
                return;
            }
        };
        info!(username = %username, mode, "Bot initialized");

        if let Some(chat_id) = self.state.alert_chat_id {
            TelegramNotifier::new(self.bot.clone(), chat_id)
                .alert(&started_alert(&username, mode, self.state.ingestor.channels().len()))
                .await;
        }
    }

    /// Start the bot in polling mode.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");
        self.announce("polling").await;

        Dispatcher::builder(self.bot.clone(), build_handler(Arc::clone(&self.state)))
            .default_handler(|upd| async move {
                debug!(update_id = ?upd.id, "Unhandled update");
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }

    /// Registers the webhook and returns the router serving it together with
    /// the dispatcher future that processes the received updates.
    ///
    /// The router answers on [`WEBHOOK_PATH`] and is meant to be merged into
    /// the API server. Telegram must send `secret` with every request.
    pub async fn webhook(
        &self,
        public_base_url: &str,
        listen: SocketAddr,
        secret: &str,
    ) -> Result<(Router, BoxFuture<'static, ()>)> {
        let url = Url::parse(&format!(
            "{}{}",
            public_base_url.trim_end_matches('/'),
            WEBHOOK_PATH
        ))?;
        info!(url = %url, "Registering webhook");

        let options = webhooks::Options::new(listen, url).secret_token(secret.to_string());
        let (listener, _stop_flag, router) = webhooks::axum_to_router(self.bot.clone(), options)
            .await
            .map_err(|e| TelegramError::WebhookFailed(e.to_string()))?;

        self.announce("webhook").await;

        let mut dispatcher =
            Dispatcher::builder(self.bot.clone(), build_handler(Arc::clone(&self.state)))
                .default_handler(|upd| async move {
                    debug!(update_id = ?upd.id, "Unhandled update");
                })
                .build();
        let dispatch = async move {
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
                )
                .await;
        };

        Ok((router, dispatch.boxed()))
    }
}

/// Builds the update handler tree.
///
/// Channel posts and plain messages go through ingestion; commands are
/// answered in the admin chat. Edited posts fall through to the default
/// handler.
fn build_handler(state: Arc<BotState>) -> UpdateHandler<teloxide::RequestError> {
    let state_for_commands = Arc::clone(&state);
    let state_for_messages = Arc::clone(&state);
    let state_for_posts = state;

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let state = Arc::clone(&state_for_commands);
                    async move { handle_command(bot, msg, cmd, state).await }
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| {
                    // Unknown commands are not deal posts
                    !msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                })
                .endpoint(move |msg: Message| {
                    let state = Arc::clone(&state_for_messages);
                    async move { handle_post(msg, state).await }
                }),
        )
        .branch(Update::filter_channel_post().endpoint(move |msg: Message| {
            let state = Arc::clone(&state_for_posts);
            info!(chat_id = %msg.chat.id, message_id = msg.id.0, "Channel post received");
            async move { handle_post(msg, state).await }
        }))
}
