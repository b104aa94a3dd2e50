//! Schema creation and column migration.
//!
//! `migrate` is idempotent: it creates missing tables and indexes and adds
//! any column an older database lacks.

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS unified_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    price TEXT,
    original_price TEXT,
    image_url TEXT,
    affiliate_url TEXT NOT NULL DEFAULT '',
    content_type TEXT NOT NULL DEFAULT 'product',
    page_type TEXT,
    category TEXT,
    subcategory TEXT,
    source_type TEXT NOT NULL DEFAULT 'manual',
    source_id TEXT,
    affiliate_platform TEXT,
    rating TEXT,
    review_count INTEGER,
    discount INTEGER,
    currency TEXT DEFAULT 'INR',
    gender TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_featured INTEGER NOT NULL DEFAULT 0,
    is_service INTEGER NOT NULL DEFAULT 0,
    is_ai_app INTEGER NOT NULL DEFAULT 0,
    display_order INTEGER NOT NULL DEFAULT 0,
    display_pages TEXT DEFAULT '["home"]',
    has_timer INTEGER NOT NULL DEFAULT 0,
    timer_duration INTEGER,
    timer_start_time INTEGER,
    processing_status TEXT DEFAULT 'active',
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE TABLE IF NOT EXISTS channel_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id INTEGER NOT NULL,
    channel_name TEXT NOT NULL DEFAULT '',
    website_page TEXT NOT NULL DEFAULT '',
    message_id INTEGER NOT NULL,
    original_text TEXT NOT NULL DEFAULT '',
    processed_text TEXT,
    extracted_urls TEXT DEFAULT '[]',
    image_url TEXT,
    is_processed INTEGER NOT NULL DEFAULT 0,
    is_posted INTEGER NOT NULL DEFAULT 0,
    processing_error TEXT,
    telegram_timestamp INTEGER,
    processed_at INTEGER,
    posted_at INTEGER,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE TABLE IF NOT EXISTS affiliate_conversions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_post_id INTEGER REFERENCES channel_posts(id) ON DELETE CASCADE,
    original_url TEXT NOT NULL,
    affiliate_url TEXT NOT NULL,
    platform TEXT,
    success INTEGER NOT NULL DEFAULT 1,
    error_message TEXT,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
"#;

const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_unified_content_active_created
    ON unified_content(is_active, created_at);
CREATE INDEX IF NOT EXISTS idx_unified_content_category
    ON unified_content(category);
CREATE INDEX IF NOT EXISTS idx_unified_content_page_type
    ON unified_content(page_type);
CREATE UNIQUE INDEX IF NOT EXISTS idx_channel_posts_message
    ON channel_posts(channel_id, message_id);
CREATE INDEX IF NOT EXISTS idx_affiliate_conversions_post
    ON affiliate_conversions(channel_post_id);
"#;

/// Columns added to tables created by older releases.
///
/// Declarations must be valid for `ALTER TABLE ADD COLUMN`, so every one is
/// nullable or carries a constant default.
const CONTENT_COLUMNS: &[(&str, &str)] = &[
    ("description", "TEXT"),
    ("price", "TEXT"),
    ("original_price", "TEXT"),
    ("image_url", "TEXT"),
    ("affiliate_url", "TEXT NOT NULL DEFAULT ''"),
    ("content_type", "TEXT NOT NULL DEFAULT 'product'"),
    ("page_type", "TEXT"),
    ("category", "TEXT"),
    ("subcategory", "TEXT"),
    ("source_type", "TEXT NOT NULL DEFAULT 'manual'"),
    ("source_id", "TEXT"),
    ("affiliate_platform", "TEXT"),
    ("rating", "TEXT"),
    ("review_count", "INTEGER"),
    ("discount", "INTEGER"),
    ("currency", "TEXT DEFAULT 'INR'"),
    ("gender", "TEXT"),
    ("is_active", "INTEGER NOT NULL DEFAULT 1"),
    ("is_featured", "INTEGER NOT NULL DEFAULT 0"),
    ("is_service", "INTEGER NOT NULL DEFAULT 0"),
    ("is_ai_app", "INTEGER NOT NULL DEFAULT 0"),
    ("display_order", "INTEGER NOT NULL DEFAULT 0"),
    ("display_pages", "TEXT DEFAULT '[\"home\"]'"),
    ("has_timer", "INTEGER NOT NULL DEFAULT 0"),
    ("timer_duration", "INTEGER"),
    ("timer_start_time", "INTEGER"),
    ("processing_status", "TEXT DEFAULT 'active'"),
    ("created_at", "INTEGER NOT NULL DEFAULT 0"),
    ("updated_at", "INTEGER NOT NULL DEFAULT 0"),
];

const CHANNEL_POST_COLUMNS: &[(&str, &str)] = &[
    ("channel_name", "TEXT NOT NULL DEFAULT ''"),
    ("website_page", "TEXT NOT NULL DEFAULT ''"),
    ("processed_text", "TEXT"),
    ("extracted_urls", "TEXT DEFAULT '[]'"),
    ("image_url", "TEXT"),
    ("is_processed", "INTEGER NOT NULL DEFAULT 0"),
    ("is_posted", "INTEGER NOT NULL DEFAULT 0"),
    ("processing_error", "TEXT"),
    ("telegram_timestamp", "INTEGER"),
    ("processed_at", "INTEGER"),
    ("posted_at", "INTEGER"),
    ("created_at", "INTEGER NOT NULL DEFAULT 0"),
];

/// Returns the column names of `table`.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn add_missing_columns(conn: &Connection, table: &str, columns: &[(&str, &str)]) -> Result<usize> {
    let existing = table_columns(conn, table)?;
    let mut added = 0;
    for (name, decl) in columns {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, name, decl))?;
        info!(table, column = name, "Added missing column");
        added += 1;
    }
    Ok(added)
}

/// Brings the schema up to date. Returns the number of columns added.
pub fn migrate(conn: &Connection) -> Result<usize> {
    conn.execute_batch(CREATE_TABLES)?;
    let added = add_missing_columns(conn, "unified_content", CONTENT_COLUMNS)?
        + add_missing_columns(conn, "channel_posts", CHANNEL_POST_COLUMNS)?;
    conn.execute_batch(CREATE_INDEXES)?;
    Ok(added)
}
