//! Telegram ingestion for PickNTrust.
//!
//! A single "master" bot receives posts from the monitored deal channels,
//! either by long polling or through a webhook mounted into the API server,
//! and turns each post into a `unified_content` row.
//!
//! # Environment Variables
//!
//! Required:
//! - `MASTER_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `BOT_ALERT_CHAT_ID` / `MASTER_ADMIN_CHAT_ID`: Chat receiving admin alerts
//! - `PUBLIC_BASE_URL`: Public URL used to register the webhook
//! - `WEBHOOK_SECRET`: Secret token Telegram sends with webhook requests
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/status` - Ingestion counters and store totals
//! - `/recent` - Latest channel posts
//! - `/channels` - Monitored channels

pub mod bot;
pub mod error;
pub mod handlers;
pub mod message;
pub mod notify;
pub mod photo;
pub mod pipeline;
pub mod state;

pub use bot::{TelegramBot, WEBHOOK_PATH};
pub use error::{Result, TelegramError};
pub use message::IngestMessage;
pub use notify::{LogNotifier, Notifier, TelegramNotifier};
pub use photo::{photo_router, photo_url};
pub use pipeline::{IngestOutcome, Ingestor, SkipReason};
pub use state::{create_shared_state, BotState};
