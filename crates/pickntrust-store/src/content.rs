//! Unified content CRUD.

use pickntrust_models::{
    ContentId, ContentItem, ContentPatch, ContentType, DisplayPages, NewContent,
    ProcessingStatus, DEFAULT_CURRENCY,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::db::{now, Database};
use crate::error::{Result, StoreError};

/// Column list shared by every content SELECT, in `map_content` order.
pub(crate) const CONTENT_SELECT: &str = "SELECT id, title, description, price, original_price,
        image_url, affiliate_url, content_type, page_type, category, subcategory, source_type,
        source_id, affiliate_platform, rating, review_count, discount, currency, gender,
        is_active, is_featured, is_service, is_ai_app, display_order, display_pages, has_timer,
        timer_duration, timer_start_time, processing_status, created_at, updated_at
    FROM unified_content";

/// Maps a row selected with [`CONTENT_SELECT`].
///
/// Tolerates the loosely typed values older databases contain.
pub(crate) fn map_content(row: &Row) -> rusqlite::Result<ContentItem> {
    let content_type: Option<String> = row.get(7)?;
    let display_pages: Option<String> = row.get(24)?;
    let status: Option<String> = row.get(28)?;
    let flag = |idx: usize| -> rusqlite::Result<bool> {
        Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or(0) != 0)
    };

    Ok(ContentItem {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get(2)?,
        price: row.get(3)?,
        original_price: row.get(4)?,
        image_url: row.get(5)?,
        affiliate_url: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        content_type: content_type
            .as_deref()
            .and_then(ContentType::parse)
            .unwrap_or_default(),
        page_type: row.get(8)?,
        category: row.get(9)?,
        subcategory: row.get(10)?,
        source_type: row
            .get::<_, Option<String>>(11)?
            .unwrap_or_else(|| "manual".to_string()),
        source_id: row.get(12)?,
        affiliate_platform: row.get(13)?,
        rating: row.get(14)?,
        review_count: row.get(15)?,
        discount: row.get(16)?,
        currency: row
            .get::<_, Option<String>>(17)?
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        gender: row.get(18)?,
        is_active: row.get::<_, Option<i64>>(19)?.map_or(true, |v| v != 0),
        is_featured: flag(20)?,
        is_service: flag(21)?,
        is_ai_app: flag(22)?,
        display_order: row.get::<_, Option<i64>>(23)?.unwrap_or(0),
        display_pages: display_pages
            .as_deref()
            .map(DisplayPages::parse)
            .unwrap_or_default(),
        has_timer: flag(25)?,
        timer_duration: row.get(26)?,
        timer_start_time: row.get(27)?,
        processing_status: status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(ProcessingStatus::parse),
        created_at: row.get::<_, Option<i64>>(29)?.unwrap_or(0),
        updated_at: row.get::<_, Option<i64>>(30)?.unwrap_or(0),
    })
}

fn apply_patch(item: &mut ContentItem, patch: ContentPatch) {
    macro_rules! set {
        ($($field:ident),*) => {
            $(if let Some(value) = patch.$field { item.$field = value; })*
        };
    }
    macro_rules! set_opt {
        ($($field:ident),*) => {
            $(if let Some(value) = patch.$field { item.$field = Some(value); })*
        };
    }

    set!(
        title, affiliate_url, content_type, currency, is_active, is_featured, is_service,
        is_ai_app, display_order, display_pages, has_timer
    );
    set_opt!(
        description, price, original_price, image_url, page_type, category, subcategory,
        affiliate_platform, rating, review_count, discount, gender, timer_duration,
        timer_start_time, processing_status
    );
}

impl Database {
    // ─────────────────────────────────────────────────────────────────────────
    // Content Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a content row and returns its id.
    pub fn insert_content(&self, content: &NewContent) -> Result<ContentId> {
        let conn = self.conn()?;
        let ts = now();
        conn.execute(
            "INSERT INTO unified_content
             (title, description, price, original_price, image_url, affiliate_url, content_type,
              page_type, category, subcategory, source_type, source_id, affiliate_platform,
              rating, review_count, discount, currency, gender, is_active, is_featured,
              is_service, is_ai_app, display_order, display_pages, has_timer, timer_duration,
              timer_start_time, processing_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?29)",
            params![
                content.title,
                content.description,
                content.price,
                content.original_price,
                content.image_url,
                content.affiliate_url,
                content.content_type.as_str(),
                content.page_type,
                content.category,
                content.subcategory,
                content.source_type,
                content.source_id,
                content.affiliate_platform,
                content.rating,
                content.review_count,
                content.discount,
                content.currency,
                content.gender,
                content.is_active,
                content.is_featured,
                content.is_service,
                content.is_ai_app,
                content.display_order,
                content.display_pages.to_json(),
                content.has_timer,
                content.timer_duration,
                content.timer_start_time,
                content.processing_status.map(|s| s.as_str()),
                ts,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, title = %content.title, pages = %content.display_pages.to_json(), "Inserted content");
        Ok(id)
    }

    /// Gets a content row by id.
    pub fn get_content(&self, id: ContentId) -> Result<Option<ContentItem>> {
        let conn = self.conn()?;
        fetch_content(&conn, id)
    }

    /// Applies a partial update and returns the updated row.
    pub fn update_content(&self, id: ContentId, patch: ContentPatch) -> Result<ContentItem> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut item = fetch_content(&tx, id)?.ok_or_else(|| StoreError::content_not_found(id))?;
        apply_patch(&mut item, patch);
        item.updated_at = now().max(item.updated_at);
        if write_content(&tx, &item)? == 0 {
            return Err(StoreError::content_not_found(id));
        }
        tx.commit()?;
        debug!(id, "Updated content");
        Ok(item)
    }

    /// Deletes a content row. Returns false if it did not exist.
    pub fn delete_content(&self, id: ContentId) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM unified_content WHERE id = ?1", params![id])?;
        if deleted > 0 {
            info!(id, "Deleted content");
        }
        Ok(deleted > 0)
    }

    /// Sets the featured flag.
    pub fn set_featured(&self, id: ContentId, featured: bool) -> Result<ContentItem> {
        self.update_content(
            id,
            ContentPatch {
                is_featured: Some(featured),
                ..Default::default()
            },
        )
    }

    /// Sets the active flag.
    pub fn set_active(&self, id: ContentId, active: bool) -> Result<ContentItem> {
        self.update_content(
            id,
            ContentPatch {
                is_active: Some(active),
                ..Default::default()
            },
        )
    }

    /// Returns every content row, newest first.
    pub fn all_content(&self) -> Result<Vec<ContentItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC", CONTENT_SELECT))?;
        let items = stmt
            .query_map([], map_content)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn fetch_content(conn: &Connection, id: ContentId) -> Result<Option<ContentItem>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", CONTENT_SELECT))?;
    Ok(stmt.query_row(params![id], map_content).optional()?)
}

/// Writes every column of `item`; returns the number of rows changed.
fn write_content(conn: &Connection, item: &ContentItem) -> Result<usize> {
    conn.execute(
        "UPDATE unified_content SET
            title = ?2, description = ?3, price = ?4, original_price = ?5, image_url = ?6,
            affiliate_url = ?7, content_type = ?8, page_type = ?9, category = ?10,
            subcategory = ?11, affiliate_platform = ?12, rating = ?13, review_count = ?14,
            discount = ?15, currency = ?16, gender = ?17, is_active = ?18, is_featured = ?19,
            is_service = ?20, is_ai_app = ?21, display_order = ?22, display_pages = ?23,
            has_timer = ?24, timer_duration = ?25, timer_start_time = ?26,
            processing_status = ?27, updated_at = ?28
         WHERE id = ?1",
        params![
            item.id,
            item.title,
            item.description,
            item.price,
            item.original_price,
            item.image_url,
            item.affiliate_url,
            item.content_type.as_str(),
            item.page_type,
            item.category,
            item.subcategory,
            item.affiliate_platform,
            item.rating,
            item.review_count,
            item.discount,
            item.currency,
            item.gender,
            item.is_active,
            item.is_featured,
            item.is_service,
            item.is_ai_app,
            item.display_order,
            item.display_pages.to_json(),
            item.has_timer,
            item.timer_duration,
            item.timer_start_time,
            item.processing_status.map(|s| s.as_str()),
            item.updated_at,
        ],
    )
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::ContentBuilder;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn sample() -> NewContent {
        ContentBuilder::new("Boat Airdopes 141", "https://amzn.to/abc")
            .price("999")
            .original_price("4490")
            .category("Electronics & Gadgets")
            .display_pages(DisplayPages::from_slugs(["prime-picks", "home"]))
            .build()
    }

    #[test]
    fn test_insert_and_get() {
        let db = db();
        let id = db.insert_content(&sample()).unwrap();

        let item = db.get_content(id).unwrap().unwrap();
        assert_eq!(item.title, "Boat Airdopes 141");
        assert_eq!(item.price.as_deref(), Some("999"));
        assert_eq!(item.display_pages.as_slice(), &["prime-picks", "home"]);
        assert_eq!(item.processing_status, Some(ProcessingStatus::Active));
        assert_eq!(item.currency, "INR");
        assert!(item.created_at > 0);
    }

    #[test]
    fn test_get_missing() {
        assert!(db().get_content(42).unwrap().is_none());
    }

    #[test]
    fn test_update_content() {
        let db = db();
        let id = db.insert_content(&sample()).unwrap();

        let updated = db
            .update_content(
                id,
                ContentPatch {
                    title: Some("Boat Airdopes 141 ANC".to_string()),
                    discount: Some(78),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Boat Airdopes 141 ANC");
        assert_eq!(updated.discount, Some(78));
        assert_eq!(updated.price.as_deref(), Some("999"));

        let stored = db.get_content(id).unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let err = db().update_content(7, ContentPatch::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_after_delete_changes_nothing() {
        let db = db();
        let id = db.insert_content(&sample()).unwrap();
        let item = db.get_content(id).unwrap().unwrap();
        assert!(db.delete_content(id).unwrap());

        assert_eq!(write_content(&db.conn().unwrap(), &item).unwrap(), 0);
        assert!(db.set_featured(id, true).unwrap_err().is_not_found());
        assert!(db.get_content(id).unwrap().is_none());
    }

    #[test]
    fn test_flags_and_delete() {
        let db = db();
        let id = db.insert_content(&sample()).unwrap();

        assert!(db.set_featured(id, true).unwrap().is_featured);
        assert!(!db.set_active(id, false).unwrap().is_active);

        assert!(db.delete_content(id).unwrap());
        assert!(!db.delete_content(id).unwrap());
    }

    #[test]
    fn test_legacy_values_are_tolerated() {
        let db = db();
        {
            let conn = db.conn().unwrap();
            conn.execute_batch(
                "INSERT INTO unified_content (title, content_type, display_pages, processing_status, currency)
                 VALUES ('Legacy', 'ai-app', 'prime-picks, click-picks', 'weird', NULL)",
            )
            .unwrap();
        }
        let item = db.all_content().unwrap().pop().unwrap();
        assert_eq!(item.content_type, ContentType::App);
        assert_eq!(item.display_pages.as_slice(), &["prime-picks", "click-picks"]);
        assert_eq!(item.processing_status, Some(ProcessingStatus::Pending));
        assert_eq!(item.currency, "INR");
    }
}
