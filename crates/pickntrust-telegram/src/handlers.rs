//! Update handlers for the Telegram bot.

use std::sync::Arc;

use pickntrust_core::ChannelRegistry;
use pickntrust_models::ChannelPost;
use pickntrust_store::StoreStats;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{debug, error, info, warn};

use crate::message::IngestMessage;
use crate::pipeline::IngestOutcome;
use crate::state::{BotState, CounterSnapshot};

/// Number of posts listed by /recent.
const RECENT_POSTS: usize = 5;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Show ingestion and store status")]
    Status,

    #[command(description = "List the latest channel posts")]
    Recent,

    #[command(description = "List monitored channels")]
    Channels,
}

/// Handles a channel post or a message sent to the bot.
pub async fn handle_post(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let ingest = IngestMessage::from_message(&msg);
    let result = state.ingestor.process(&ingest).await;
    state.counters.record(&result);

    match result {
        Ok(IngestOutcome::Stored { content_id, post_id }) => {
            info!(chat_id = ingest.chat_id, message_id = ingest.message_id, content_id, post_id, "Post ingested");
        }
        Ok(IngestOutcome::Skipped(reason)) => {
            debug!(chat_id = ingest.chat_id, message_id = ingest.message_id, %reason, "Post skipped");
        }
        Err(e) => {
            error!(chat_id = ingest.chat_id, message_id = ingest.message_id, error = %e, "Post ingestion failed");
        }
    }
    Ok(())
}

/// Dispatches an admin command.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if !state.is_admin_chat(msg.chat.id.0) {
        debug!(chat_id = %msg.chat.id, "Ignoring command from non-admin chat");
        return Ok(());
    }

    let reply = match cmd {
        Command::Start => start_text(state.ingestor.channels().len()),
        Command::Help => Command::descriptions().to_string(),
        Command::Status => match state.ingestor.db().stats() {
            Ok(stats) => status_text(&stats, state.counters.snapshot(), state.uptime_seconds()),
            Err(e) => {
                warn!(error = %e, "Failed to load store stats");
                format!("❌ Store unavailable: {}", escape(&e.to_string()))
            }
        },
        Command::Recent => match state.ingestor.db().recent_channel_posts(RECENT_POSTS) {
            Ok(posts) => recent_text(&posts),
            Err(e) => {
                warn!(error = %e, "Failed to load recent posts");
                format!("❌ Store unavailable: {}", escape(&e.to_string()))
            }
        },
        Command::Channels => channels_text(state.ingestor.channels()),
    };

    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    info!(chat_id = %msg.chat.id, "Command handled: {:?}", cmd);
    Ok(())
}

fn start_text(channels: usize) -> String {
    format!(
        "Welcome to the PickNTrust ingestion bot! 🛍️\n\n\
         I watch {} deal channels and publish their posts to the site.\n\n\
         Type /help for all commands.",
        channels
    )
}

fn status_text(stats: &StoreStats, counters: CounterSnapshot, uptime_secs: u64) -> String {
    format!(
        "<b>Status</b>\n\
         • Uptime: {}m\n\
         • This run: {} stored, {} skipped, {} failed\n\n\
         <b>Store</b>\n\
         • Content: {} ({} visible, {} hidden)\n\
         • Channel posts: {} ({} processed, {} failed)\n\
         • Affiliate conversions: {}",
        uptime_secs / 60,
        counters.stored,
        counters.skipped,
        counters.failed,
        stats.total,
        stats.visible,
        stats.hidden,
        stats.channel_posts,
        stats.channel_posts_processed,
        stats.channel_posts_failed,
        stats.affiliate_conversions,
    )
}

fn recent_text(posts: &[ChannelPost]) -> String {
    if posts.is_empty() {
        return "No channel posts yet.".to_string();
    }

    let mut text = String::from("<b>Recent posts</b>\n");
    for post in posts {
        let status = if post.processing_error.is_some() {
            "❌"
        } else if post.is_posted {
            "✅"
        } else {
            "⏳"
        };
        let summary = post
            .processed_text
            .as_deref()
            .unwrap_or(&post.original_text);
        let summary: String = summary.chars().take(60).collect();
        text.push_str(&format!(
            "{} <code>{}</code> #{} {}\n",
            status,
            escape(&post.website_page),
            post.message_id,
            escape(&summary),
        ));
    }
    text
}

fn channels_text(channels: &ChannelRegistry) -> String {
    let mut text = format!("<b>Monitored channels ({})</b>\n", channels.len());
    for channel in channels.channels() {
        let conversion = if channel.convert_links {
            channel.effective_network().to_string()
        } else {
            "no conversion".to_string()
        };
        text.push_str(&format!(
            "• {} → <code>{}</code> ({})\n",
            escape(&channel.page_name),
            escape(&channel.page_slug),
            conversion,
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, error: Option<&str>, posted: bool) -> ChannelPost {
        ChannelPost {
            id,
            channel_id: -100,
            channel_name: "Prime Picks".to_string(),
            website_page: "prime-picks".to_string(),
            message_id: id * 10,
            original_text: "Deal <b>now</b> https://amzn.to/x".to_string(),
            processed_text: None,
            extracted_urls: vec!["https://amzn.to/x".to_string()],
            image_url: None,
            is_processed: true,
            is_posted: posted,
            processing_error: error.map(str::to_string),
            telegram_timestamp: None,
            processed_at: None,
            posted_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_recent_text() {
        let text = recent_text(&[post(1, None, true), post(2, Some("scrape failed"), false)]);
        assert!(text.contains("✅ <code>prime-picks</code> #10"));
        assert!(text.contains("❌ <code>prime-picks</code> #20"));
        assert!(text.contains("&lt;b&gt;"));
        assert_eq!(recent_text(&[]), "No channel posts yet.");
    }

    #[test]
    fn test_channels_text() {
        let text = channels_text(&ChannelRegistry::defaults());
        assert!(text.contains("Monitored channels (8)"));
        assert!(text.contains("Prime Picks → <code>prime-picks</code> (amazon)"));
        assert!(text.contains("Loot Box → <code>loot-box</code> (no conversion)"));
        assert!(text.contains("Click Picks → <code>click-picks</code> (cuelinks)"));
    }

    #[test]
    fn test_status_text() {
        let stats = StoreStats {
            total: 12,
            visible: 10,
            hidden: 2,
            channel_posts: 5,
            channel_posts_processed: 4,
            channel_posts_failed: 1,
            affiliate_conversions: 4,
            ..StoreStats::default()
        };
        let text = status_text(
            &stats,
            CounterSnapshot {
                stored: 3,
                skipped: 1,
                failed: 0,
            },
            125,
        );
        assert!(text.contains("Uptime: 2m"));
        assert!(text.contains("3 stored, 1 skipped, 0 failed"));
        assert!(text.contains("Content: 12 (10 visible, 2 hidden)"));
    }

    #[test]
    fn test_command_descriptions() {
        let help = Command::descriptions().to_string();
        assert!(help.contains("/recent"));
        assert!(help.contains("/channels"));
    }
}
