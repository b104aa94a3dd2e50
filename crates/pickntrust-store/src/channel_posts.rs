//! Raw channel posts and the affiliate conversions made for them.

use pickntrust_models::{ChannelPost, NewChannelPost};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::db::{now, Database};
use crate::error::{is_constraint_violation, Result, StoreError};

const CHANNEL_POST_SELECT: &str = "SELECT id, channel_id, channel_name, website_page, message_id,
        original_text, processed_text, extracted_urls, image_url, is_processed, is_posted,
        processing_error, telegram_timestamp, processed_at, posted_at, created_at
    FROM channel_posts";

fn map_channel_post(row: &Row) -> rusqlite::Result<ChannelPost> {
    let urls: Option<String> = row.get(7)?;
    Ok(ChannelPost {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        channel_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        website_page: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        message_id: row.get(4)?,
        original_text: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        processed_text: row.get(6)?,
        extracted_urls: urls
            .and_then(|u| serde_json::from_str(&u).ok())
            .unwrap_or_default(),
        image_url: row.get(8)?,
        is_processed: row.get::<_, Option<i64>>(9)?.unwrap_or(0) != 0,
        is_posted: row.get::<_, Option<i64>>(10)?.unwrap_or(0) != 0,
        processing_error: row.get(11)?,
        telegram_timestamp: row.get(12)?,
        processed_at: row.get(13)?,
        posted_at: row.get(14)?,
        created_at: row.get::<_, Option<i64>>(15)?.unwrap_or(0),
    })
}

/// Outcome of one affiliate conversion, as recorded for auditing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRecord<'a> {
    pub channel_post_id: Option<i64>,
    pub original_url: &'a str,
    pub affiliate_url: &'a str,
    pub platform: Option<&'a str>,
    pub error: Option<&'a str>,
}

impl Database {
    // ─────────────────────────────────────────────────────────────────────────
    // Channel Post Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Finds the post stored for a channel message.
    pub fn find_channel_post(&self, channel_id: i64, message_id: i64) -> Result<Option<ChannelPost>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE channel_id = ?1 AND message_id = ?2",
            CHANNEL_POST_SELECT
        ))?;
        Ok(stmt
            .query_row(params![channel_id, message_id], map_channel_post)
            .optional()?)
    }

    /// Stores a raw channel post.
    ///
    /// Fails with [`StoreError::Conflict`] when the message was stored before.
    pub fn insert_channel_post(&self, post: &NewChannelPost) -> Result<i64> {
        let conn = self.conn()?;
        let urls = serde_json::to_string(&post.extracted_urls)?;
        let result = conn.execute(
            "INSERT INTO channel_posts
             (channel_id, channel_name, website_page, message_id, original_text, extracted_urls,
              image_url, telegram_timestamp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                post.channel_id,
                post.channel_name,
                post.website_page,
                post.message_id,
                post.original_text,
                urls,
                post.image_url,
                post.telegram_timestamp,
                now(),
            ],
        );
        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(id, channel_id = post.channel_id, message_id = post.message_id, "Stored channel post");
                Ok(id)
            }
            Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict(format!(
                "channel post {}/{}",
                post.channel_id, post.message_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Records the processing result of a post.
    ///
    /// A post with an error is marked processed but not posted.
    pub fn mark_channel_post(
        &self,
        id: i64,
        processed_text: Option<&str>,
        posted: bool,
        error: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let ts = now();
        let posted = posted && error.is_none();
        let updated = conn.execute(
            "UPDATE channel_posts SET
                processed_text = COALESCE(?2, processed_text), is_processed = 1,
                is_posted = ?3, processing_error = ?4, processed_at = ?5,
                posted_at = CASE WHEN ?3 THEN ?5 ELSE posted_at END
             WHERE id = ?1",
            params![id, processed_text, posted, error, ts],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound {
                kind: "channel post",
                id: id.to_string(),
            });
        }
        if let Some(error) = error {
            warn!(id, error, "Channel post failed");
        }
        Ok(())
    }

    /// Sets the image of a post.
    pub fn set_channel_post_image(&self, id: i64, image_url: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE channel_posts SET image_url = ?2 WHERE id = ?1",
            params![id, image_url],
        )?;
        Ok(())
    }

    /// Returns the latest posts, newest first.
    pub fn recent_channel_posts(&self, limit: usize) -> Result<Vec<ChannelPost>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
            CHANNEL_POST_SELECT
        ))?;
        let posts = stmt
            .query_map(params![limit as i64], map_channel_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Records an affiliate conversion. Returns the conversion id.
    pub fn record_conversion(&self, record: &ConversionRecord<'_>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO affiliate_conversions
             (channel_post_id, original_url, affiliate_url, platform, success, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.channel_post_id,
                record.original_url,
                record.affiliate_url,
                record.platform,
                record.error.is_none(),
                record.error,
                now(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Counts the conversions recorded for a post.
    pub fn conversion_count(&self, channel_post_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM affiliate_conversions WHERE channel_post_id = ?1",
            params![channel_post_id],
            |row| row.get(0),
        )?)
    }
}
