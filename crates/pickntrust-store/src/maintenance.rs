//! Idempotent repairs of stored content.
//!
//! Each operation returns the number of rows it changed; running it a second
//! time changes nothing.

use std::collections::HashSet;

use pickntrust_core::standardize_category;
use pickntrust_models::{normalize_slug, DisplayPages, ProcessingStatus, DEFAULT_CURRENCY, PLACEHOLDER_IMAGE};
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

use crate::content::{map_content, CONTENT_SELECT};
use crate::db::Database;
use crate::error::Result;
use crate::schema::table_columns;

/// Rows changed by [`Database::run_all_maintenance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub display_pages: usize,
    pub processing_status: usize,
    pub expired: usize,
    pub duplicates: usize,
    pub categories: usize,
    pub backfilled: usize,
}

impl MaintenanceReport {
    /// Total rows changed.
    pub fn total(&self) -> usize {
        self.display_pages
            + self.processing_status
            + self.expired
            + self.duplicates
            + self.categories
            + self.backfilled
    }
}

/// Writes `column = value` for each `(id, value)` inside one transaction.
fn rewrite_column(conn: &mut Connection, column: &str, updates: &[(i64, Option<String>)]) -> Result<usize> {
    if updates.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "UPDATE unified_content SET {} = ?2 WHERE id = ?1",
            column
        ))?;
        for (id, value) in updates {
            stmt.execute(params![id, value])?;
        }
    }
    tx.commit()?;
    Ok(updates.len())
}

fn text_column(conn: &Connection, column: &str) -> Result<Vec<(i64, Option<String>)>> {
    let mut stmt = conn.prepare(&format!("SELECT id, {} FROM unified_content", column))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl Database {
    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Rewrites legacy `display_pages` values as canonical JSON arrays.
    pub fn normalize_display_pages(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let updates: Vec<_> = text_column(&conn, "display_pages")?
            .into_iter()
            .filter_map(|(id, raw)| {
                let raw = raw?;
                let canonical = DisplayPages::parse(&raw).to_json();
                (canonical != raw).then_some((id, Some(canonical)))
            })
            .collect();
        let changed = rewrite_column(&mut conn, "display_pages", &updates)?;
        info!(changed, "Normalized display pages");
        Ok(changed)
    }

    /// Canonicalizes `processing_status`.
    ///
    /// A value left in a legacy `status` column is folded in once and then
    /// cleared, so later status changes are not overwritten. Unknown values
    /// become `pending`; NULL stays NULL.
    pub fn normalize_processing_status(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let has_legacy = table_columns(&conn, "unified_content")?
            .iter()
            .any(|c| c.eq_ignore_ascii_case("status"));

        let rows: Vec<(i64, Option<String>, Option<String>)> = if has_legacy {
            let mut stmt = conn.prepare(
                "SELECT id, processing_status, status FROM unified_content
                 WHERE status IS NOT NULL OR processing_status IS NOT NULL",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            text_column(&conn, "processing_status")?
                .into_iter()
                .map(|(id, status)| (id, status, None))
                .collect()
        };

        let canonical = |raw: &str| {
            let raw = raw.trim();
            (!raw.is_empty()).then(|| ProcessingStatus::parse(raw).as_str().to_string())
        };

        let mut status_updates = Vec::new();
        let mut legacy_cleared = Vec::new();
        for (id, current, legacy) in rows {
            let target = match legacy {
                Some(legacy) => {
                    legacy_cleared.push((id, None));
                    canonical(&legacy).or_else(|| current.as_deref().and_then(canonical))
                }
                None => current.as_deref().and_then(canonical),
            };
            if target != current {
                status_updates.push((id, target));
            }
        }

        let mut changed: HashSet<i64> = status_updates.iter().map(|(id, _)| *id).collect();
        changed.extend(legacy_cleared.iter().map(|(id, _)| *id));

        rewrite_column(&mut conn, "processing_status", &status_updates)?;
        rewrite_column(&mut conn, "status", &legacy_cleared)?;
        info!(changed = changed.len(), "Normalized processing status");
        Ok(changed.len())
    }

    /// Deactivates rows whose timer ran out at or before `now`.
    pub fn expire_timers(&self, now: i64) -> Result<usize> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE has_timer = 1 AND is_active = 1",
            CONTENT_SELECT
        ))?;
        let expired: Vec<i64> = stmt
            .query_map([], map_content)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|item| item.is_expired(now))
            .map(|item| item.id)
            .collect();
        for id in &expired {
            conn.execute(
                "UPDATE unified_content SET is_active = 0, updated_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;
        }
        info!(changed = expired.len(), "Expired timed deals");
        Ok(expired.len())
    }

    /// Deletes duplicate rows sharing `(affiliate_url, page_type)`, keeping
    /// the newest.
    pub fn dedupe_content(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let rows: Vec<(i64, String, Option<String>)> = {
            let mut stmt = conn.prepare(
                "SELECT id, affiliate_url, page_type FROM unified_content
                 WHERE affiliate_url IS NOT NULL AND TRIM(affiliate_url) != ''
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut seen = HashSet::new();
        let duplicates: Vec<i64> = rows
            .into_iter()
            .filter_map(|(id, url, page_type)| {
                let key = (url.trim().to_string(), page_type.unwrap_or_default());
                (!seen.insert(key)).then_some(id)
            })
            .collect();

        let tx = conn.transaction()?;
        for id in &duplicates {
            tx.execute("DELETE FROM unified_content WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        info!(changed = duplicates.len(), "Removed duplicate content");
        Ok(duplicates.len())
    }

    /// Maps categories onto the canonical category names.
    pub fn standardize_categories(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let updates: Vec<_> = text_column(&conn, "category")?
            .into_iter()
            .filter_map(|(id, raw)| {
                let raw = raw?;
                if raw.trim().is_empty() {
                    return None;
                }
                let standard = standardize_category(&raw);
                (standard != raw).then_some((id, Some(standard)))
            })
            .collect();
        let changed = rewrite_column(&mut conn, "category", &updates)?;
        info!(changed, "Standardized categories");
        Ok(changed)
    }

    /// Fills missing images, currencies and display pages.
    ///
    /// Rows without display pages get their `page_type` as the only page.
    pub fn backfill_defaults(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let mut changed = conn.execute(
            "UPDATE unified_content SET image_url = ?1 WHERE image_url IS NULL OR TRIM(image_url) = ''",
            params![PLACEHOLDER_IMAGE],
        )?;
        changed += conn.execute(
            "UPDATE unified_content SET currency = ?1 WHERE currency IS NULL OR TRIM(currency) = ''",
            params![DEFAULT_CURRENCY],
        )?;

        let pages: Vec<(i64, Option<String>)> = {
            let mut stmt = conn.prepare(
                "SELECT id, page_type FROM unified_content
                 WHERE (display_pages IS NULL OR TRIM(display_pages) = '')
                   AND page_type IS NOT NULL AND TRIM(page_type) != ''",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        let updates: Vec<_> = pages
            .into_iter()
            .filter_map(|(id, page_type)| {
                let slug = normalize_slug(&page_type?);
                Some((id, Some(DisplayPages::single(&slug).to_json())))
            })
            .collect();
        changed += rewrite_column(&mut conn, "display_pages", &updates)?;

        info!(changed, "Backfilled defaults");
        Ok(changed)
    }

    /// Runs every maintenance operation in dependency order.
    pub fn run_all_maintenance(&self, now: i64) -> Result<MaintenanceReport> {
        Ok(MaintenanceReport {
            processing_status: self.normalize_processing_status()?,
            backfilled: self.backfill_defaults()?,
            display_pages: self.normalize_display_pages()?,
            categories: self.standardize_categories()?,
            expired: self.expire_timers(now)?,
            duplicates: self.dedupe_content()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::{ContentBuilder, ContentPatch};

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn raw_insert(db: &Database, sql: &str) {
        db.conn().unwrap().execute_batch(sql).unwrap();
    }

    fn column(db: &Database, column: &str, id: i64) -> Option<String> {
        db.conn()
            .unwrap()
            .query_row(
                &format!("SELECT {} FROM unified_content WHERE id = ?1", column),
                params![id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_normalize_display_pages() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, display_pages) VALUES ('A', 'prime-picks, Click Picks');
             INSERT INTO unified_content (title, display_pages) VALUES ('B', '[\"home\"]');",
        );

        assert_eq!(db.normalize_display_pages().unwrap(), 1);
        assert_eq!(column(&db, "display_pages", 1).as_deref(), Some(r#"["prime-picks","click-picks"]"#));
        assert_eq!(db.normalize_display_pages().unwrap(), 0);
    }

    #[test]
    fn test_normalize_processing_status() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, processing_status) VALUES ('A', ' Active ');
             INSERT INTO unified_content (title, processing_status) VALUES ('B', 'mystery');
             INSERT INTO unified_content (title, processing_status) VALUES ('C', NULL);",
        );

        assert_eq!(db.normalize_processing_status().unwrap(), 2);
        assert_eq!(column(&db, "processing_status", 1).as_deref(), Some("active"));
        assert_eq!(column(&db, "processing_status", 2).as_deref(), Some("pending"));
        assert_eq!(column(&db, "processing_status", 3), None);
        assert_eq!(db.normalize_processing_status().unwrap(), 0);
    }

    #[test]
    fn test_legacy_status_column_is_folded() {
        let db = db();
        raw_insert(
            &db,
            "ALTER TABLE unified_content ADD COLUMN status TEXT;
             INSERT INTO unified_content (title, status) VALUES ('Archived', 'expired');",
        );

        assert_eq!(db.normalize_processing_status().unwrap(), 1);
        assert_eq!(column(&db, "processing_status", 1).as_deref(), Some("archived"));
        assert_eq!(column(&db, "status", 1), None);
        assert_eq!(db.normalize_processing_status().unwrap(), 0);
    }

    #[test]
    fn test_status_change_survives_renormalizing() {
        let db = db();
        raw_insert(
            &db,
            "ALTER TABLE unified_content ADD COLUMN status TEXT;
             INSERT INTO unified_content (title, status) VALUES ('Deal', 'published');",
        );

        assert_eq!(db.normalize_processing_status().unwrap(), 1);
        assert_eq!(column(&db, "processing_status", 1).as_deref(), Some("active"));

        db.update_content(
            1,
            ContentPatch {
                processing_status: Some(ProcessingStatus::Archived),
                ..ContentPatch::default()
            },
        )
        .unwrap();

        assert_eq!(db.normalize_processing_status().unwrap(), 0);
        assert_eq!(db.normalize_processing_status().unwrap(), 0);
        assert_eq!(column(&db, "processing_status", 1).as_deref(), Some("archived"));
    }

    #[test]
    fn test_expire_timers() {
        let db = db();
        let id = db
            .insert_content(&ContentBuilder::new("Flash", "https://x.in/a").timer(2, 1_000).build())
            .unwrap();
        db.insert_content(&ContentBuilder::new("Plain", "https://x.in/b").build())
            .unwrap();

        assert_eq!(db.expire_timers(1_000 + 3_600).unwrap(), 0);
        assert_eq!(db.expire_timers(1_000 + 7_200).unwrap(), 1);
        assert!(!db.get_content(id).unwrap().unwrap().is_active);
        assert_eq!(db.expire_timers(1_000 + 7_200).unwrap(), 0);
    }

    #[test]
    fn test_expire_timers_ignores_overflowing_timer() {
        let db = db();
        let id = db
            .insert_content(
                &ContentBuilder::new("Forever", "https://x.in/a")
                    .timer(i64::MAX / 1000, 1_700_000_000)
                    .build(),
            )
            .unwrap();

        assert_eq!(db.expire_timers(10).unwrap(), 0);
        assert_eq!(db.expire_timers(i64::MAX).unwrap(), 0);
        assert!(db.get_content(id).unwrap().unwrap().is_active);
    }

    #[test]
    fn test_dedupe_keeps_newest() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, affiliate_url, page_type, created_at) VALUES ('old', 'https://x.in/a', 'prime-picks', 100);
             INSERT INTO unified_content (title, affiliate_url, page_type, created_at) VALUES ('new', 'https://x.in/a', 'prime-picks', 200);
             INSERT INTO unified_content (title, affiliate_url, page_type, created_at) VALUES ('other page', 'https://x.in/a', 'click-picks', 50);",
        );

        assert_eq!(db.dedupe_content().unwrap(), 1);
        let titles: Vec<_> = db.all_content().unwrap().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["other page", "new"]);
        assert_eq!(db.dedupe_content().unwrap(), 0);
    }

    #[test]
    fn test_standardize_categories() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, category) VALUES ('A', 'jewellery');
             INSERT INTO unified_content (title, category) VALUES ('B', 'Electronics & Gadgets');",
        );

        assert_eq!(db.standardize_categories().unwrap(), 1);
        assert_eq!(column(&db, "category", 1).as_deref(), Some("Jewelry & Watches"));
    }

    #[test]
    fn test_backfill_defaults() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, image_url, currency, page_type, display_pages)
             VALUES ('A', NULL, NULL, 'travel-picks', NULL);",
        );

        assert_eq!(db.backfill_defaults().unwrap(), 3);
        let item = db.get_content(1).unwrap().unwrap();
        assert_eq!(item.image_url.as_deref(), Some(PLACEHOLDER_IMAGE));
        assert_eq!(item.currency, "INR");
        assert_eq!(item.display_pages.as_slice(), &["travel-picks"]);
        assert_eq!(db.backfill_defaults().unwrap(), 0);
    }

    #[test]
    fn test_run_all_is_idempotent() {
        let db = db();
        raw_insert(
            &db,
            "INSERT INTO unified_content (title, category, display_pages) VALUES ('A', 'fashion', 'home');",
        );

        let first = db.run_all_maintenance(0).unwrap();
        assert!(first.total() > 0);
        assert_eq!(db.run_all_maintenance(0).unwrap().total(), 0);
    }
}
