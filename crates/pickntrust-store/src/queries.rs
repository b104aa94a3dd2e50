//! Read queries behind the public pages.
//!
//! SQL narrows the candidate rows; visibility (`ContentItem::is_visible`) and
//! display page membership (`DisplayPages::matches`) are then applied in Rust
//! so every query shares one rule and legacy `display_pages` shapes match the
//! same way canonical ones do.

use std::collections::{BTreeMap, BTreeSet};

use pickntrust_models::{ContentItem, PageFilter};
use rusqlite::types::Value;
use rusqlite::params_from_iter;
use serde::Serialize;

use crate::content::{map_content, CONTENT_SELECT};
use crate::db::{now, Database};
use crate::error::Result;

/// Limit and offset of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    /// Default page size of public listings.
    pub const DEFAULT_LIMIT: usize = 50;
    /// Largest page size of public listings.
    pub const MAX_LIMIT: usize = 100;
    /// Largest page size of admin listings.
    pub const ADMIN_MAX_LIMIT: usize = 500;

    /// Builds a pagination with `limit` clamped to `1..=max`.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>, default: usize, max: usize) -> Self {
        let limit = limit
            .map(|l| l.clamp(1, max as i64) as usize)
            .unwrap_or(default.min(max));
        let offset = offset.map(|o| o.max(0) as usize).unwrap_or(0);
        Self { limit, offset }
    }

    /// Public listing pagination (default 50, at most 100).
    pub fn public(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self::clamped(limit, offset, Self::DEFAULT_LIMIT, Self::MAX_LIMIT)
    }

    /// Admin listing pagination (default 50, at most 500).
    pub fn admin(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self::clamped(limit, offset, Self::DEFAULT_LIMIT, Self::ADMIN_MAX_LIMIT)
    }

    fn apply(&self, items: impl Iterator<Item = ContentItem>) -> Vec<ContentItem> {
        items.skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::public(None, None)
    }
}

/// Content counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: i64,
    pub visible: i64,
    pub hidden: i64,
    pub featured: i64,
    pub by_content_type: BTreeMap<String, i64>,
    pub by_source: BTreeMap<String, i64>,
    pub channel_posts: i64,
    pub channel_posts_processed: i64,
    pub channel_posts_failed: i64,
    pub affiliate_conversions: i64,
}

/// Returns None for "no filter" category values.
fn category_filter(category: Option<&str>) -> Option<&str> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Small WHERE clause builder.
#[derive(Default)]
struct Filter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Filter {
    fn new() -> Self {
        Self::default()
    }

    fn clause(mut self, sql: &str) -> Self {
        self.clauses.push(sql.to_string());
        self
    }

    fn bind(mut self, sql: &str, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self.clauses.push(sql.replace('?', &format!("?{}", self.values.len())));
        self
    }

    fn category(self, category: Option<&str>) -> Self {
        match category_filter(category) {
            Some(c) => self.bind("LOWER(TRIM(category)) = LOWER(?)", c.to_string()),
            None => self,
        }
    }

    fn sql(&self, order_by: &str) -> String {
        let mut sql = CONTENT_SELECT.to_string();
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
        sql
    }
}

const NEWEST_FIRST: &str = "created_at DESC, id DESC";
const DISPLAY_ORDER: &str = "display_order DESC, created_at DESC, id DESC";

fn sorted_categories(items: &[ContentItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|i| i.category.as_deref().map(str::trim))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Database {
    // ─────────────────────────────────────────────────────────────────────────
    // Page Queries
    // ─────────────────────────────────────────────────────────────────────────

    fn select(&self, filter: &Filter, order_by: &str) -> Result<Vec<ContentItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&filter.sql(order_by))?;
        let items = stmt
            .query_map(params_from_iter(filter.values.iter()), map_content)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn select_visible(&self, filter: Filter, order_by: &str) -> Result<Vec<ContentItem>> {
        let now = now();
        let items = self.select(&filter.clause("is_active = 1"), order_by)?;
        Ok(items.into_iter().filter(|i| i.is_visible(now)).collect())
    }

    fn visible_on_page(&self, page: &str, category: Option<&str>) -> Result<Vec<ContentItem>> {
        let filter = Filter::new().category(category);
        let items = match PageFilter::for_page(page) {
            PageFilter::Featured => self.select_visible(filter.clause("is_featured = 1"), NEWEST_FIRST)?,
            PageFilter::Services => self.select_visible(filter.clause("is_service = 1"), NEWEST_FIRST)?,
            PageFilter::Apps => self.select_visible(filter.clause("is_ai_app = 1"), NEWEST_FIRST)?,
            PageFilter::Slug(slug) => self
                .select_visible(filter, NEWEST_FIRST)?
                .into_iter()
                .filter(|i| i.display_pages.matches(&slug))
                .collect(),
        };
        Ok(items)
    }

    /// Lists the visible rows of a site page, newest first.
    ///
    /// `top-picks`, `services` and `apps` select by flag; every other page by
    /// display page membership.
    pub fn list_page(
        &self,
        page: &str,
        category: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<ContentItem>> {
        let items = self.visible_on_page(page, category)?;
        Ok(pagination.apply(items.into_iter()))
    }

    /// Distinct categories of the visible rows on a page, sorted.
    pub fn page_categories(&self, page: &str) -> Result<Vec<String>> {
        Ok(sorted_categories(&self.visible_on_page(page, None)?))
    }

    /// Lists visible rows by their `page_type` column.
    pub fn list_by_page_type(
        &self,
        page_type: &str,
        category: Option<&str>,
        featured: Option<bool>,
        pagination: Pagination,
    ) -> Result<Vec<ContentItem>> {
        let mut filter = Filter::new()
            .bind("page_type = ?", page_type.trim().to_string())
            .category(category);
        if let Some(featured) = featured {
            filter = filter.bind("is_featured = ?", featured);
        }
        let items = self.select_visible(filter, DISPLAY_ORDER)?;
        Ok(pagination.apply(items.into_iter()))
    }

    /// Distinct categories of the visible rows with a `page_type`, sorted.
    pub fn page_type_categories(&self, page_type: &str) -> Result<Vec<String>> {
        let filter = Filter::new().bind("page_type = ?", page_type.trim().to_string());
        Ok(sorted_categories(&self.select_visible(filter, NEWEST_FIRST)?))
    }

    /// Lists visible rows of a category.
    ///
    /// With `page` other than `all`, rows must be displayed on that page or
    /// have no display pages at all.
    pub fn list_by_category(
        &self,
        category: &str,
        page: &str,
        pagination: Pagination,
    ) -> Result<Vec<ContentItem>> {
        let page = page.trim();
        let items = self.select_visible(Filter::new().category(Some(category)), NEWEST_FIRST)?;
        let items = items.into_iter().filter(|i| {
            page.is_empty()
                || page.eq_ignore_ascii_case("all")
                || i.display_pages.is_empty()
                || i.display_pages.matches(page)
        });
        Ok(pagination.apply(items))
    }

    /// Lists visible featured rows.
    pub fn list_featured(&self, limit: Option<i64>) -> Result<Vec<ContentItem>> {
        let items = self.select_visible(Filter::new().clause("is_featured = 1"), DISPLAY_ORDER)?;
        let pagination = Pagination::clamped(limit, None, 10, Pagination::MAX_LIMIT);
        Ok(pagination.apply(items.into_iter()))
    }

    /// Lists visible services: flagged, typed or categorized as a service.
    pub fn list_services(&self) -> Result<Vec<ContentItem>> {
        self.select_visible(
            Filter::new().clause(
                "(is_service = 1 OR content_type = 'service' OR LOWER(category) LIKE '%service%')",
            ),
            DISPLAY_ORDER,
        )
    }

    /// Lists visible apps: flagged, typed or categorized as an app.
    pub fn list_apps(&self) -> Result<Vec<ContentItem>> {
        self.select_visible(
            Filter::new()
                .clause("(is_ai_app = 1 OR content_type = 'app' OR LOWER(category) LIKE '%app%')"),
            DISPLAY_ORDER,
        )
    }

    fn search_filter(category: Option<&str>, search: Option<&str>) -> Filter {
        let filter = Filter::new().category(category);
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => filter.bind(
                "(LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(COALESCE(description, '')) LIKE ? ESCAPE '\\')",
                format!("%{}%", escape_like(&term.to_lowercase())),
            ),
            None => filter,
        }
    }

    /// Admin search over every row, hidden ones included.
    pub fn search(
        &self,
        category: Option<&str>,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<ContentItem>> {
        let items = self.select(&Self::search_filter(category, search), NEWEST_FIRST)?;
        Ok(pagination.apply(items.into_iter()))
    }

    /// Search over the visible rows.
    pub fn search_visible(
        &self,
        category: Option<&str>,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<ContentItem>> {
        let items = self.select_visible(Self::search_filter(category, search), NEWEST_FIRST)?;
        Ok(pagination.apply(items.into_iter()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statistics
    // ─────────────────────────────────────────────────────────────────────────

    /// Collects dashboard counters.
    pub fn stats(&self) -> Result<StoreStats> {
        let now = now();
        let items = self.select(&Filter::new(), NEWEST_FIRST)?;

        let mut stats = StoreStats {
            total: items.len() as i64,
            ..Default::default()
        };
        for item in &items {
            if item.is_visible(now) {
                stats.visible += 1;
            } else {
                stats.hidden += 1;
            }
            if item.is_featured {
                stats.featured += 1;
            }
            *stats
                .by_content_type
                .entry(item.content_type.as_str().to_string())
                .or_default() += 1;
            *stats.by_source.entry(item.source_type.clone()).or_default() += 1;
        }

        let conn = self.conn()?;
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));
        stats.channel_posts = count("SELECT COUNT(*) FROM channel_posts")?;
        stats.channel_posts_processed =
            count("SELECT COUNT(*) FROM channel_posts WHERE is_processed = 1")?;
        stats.channel_posts_failed =
            count("SELECT COUNT(*) FROM channel_posts WHERE processing_error IS NOT NULL")?;
        stats.affiliate_conversions = count("SELECT COUNT(*) FROM affiliate_conversions")?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::{ContentBuilder, ContentType, DisplayPages, NewContent, ProcessingStatus};

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn row(title: &str, pages: &[&str]) -> ContentBuilder {
        ContentBuilder::new(title, format!("https://example.com/{}", title.replace(' ', "-")))
            .display_pages(DisplayPages::from_slugs(pages.iter().copied()))
    }

    fn insert(db: &Database, content: NewContent) -> i64 {
        db.insert_content(&content).unwrap()
    }

    #[test]
    fn test_pagination_clamps() {
        assert_eq!(Pagination::public(None, None), Pagination { limit: 50, offset: 0 });
        assert_eq!(Pagination::public(Some(0), Some(-5)).limit, 1);
        assert_eq!(Pagination::public(Some(1000), None).limit, 100);
        assert_eq!(Pagination::admin(Some(1000), None).limit, 500);
    }

    #[test]
    fn test_list_page_exact_membership() {
        let db = db();
        insert(&db, row("Ai Tool", &["apps-ai-apps"]).build());
        insert(&db, row("Plain", &["apps"]).build());

        let titles: Vec<_> = db
            .list_page("click-picks", None, Pagination::default())
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert!(titles.is_empty());

        insert(&db, row("Click", &["click-picks", "home"]).build());
        let items = db.list_page("click-picks", None, Pagination::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Click");
    }

    #[test]
    fn test_list_page_default_page_for_empty_pages() {
        let db = db();
        insert(&db, row("Orphan", &[]).build());

        assert_eq!(db.list_page("prime-picks", None, Pagination::default()).unwrap().len(), 1);
        assert!(db.list_page("home", None, Pagination::default()).unwrap().is_empty());
    }

    #[test]
    fn test_list_page_virtual_pages() {
        let db = db();
        insert(&db, row("Featured", &["prime-picks"]).flags(true, false, false).build());
        insert(&db, row("Service", &["deals-hub"]).flags(false, true, false).build());
        insert(&db, row("App", &["click-picks"]).flags(false, false, true).build());

        let page = |p: &str| db.list_page(p, None, Pagination::default()).unwrap();
        assert_eq!(page("top-picks")[0].title, "Featured");
        assert_eq!(page("services")[0].title, "Service");
        assert_eq!(page("apps")[0].title, "App");
        assert_eq!(page("apps-ai-apps")[0].title, "App");
    }

    #[test]
    fn test_hidden_rows_never_listed() {
        let db = db();
        insert(&db, row("Inactive", &["home"]).build());
        let id = insert(&db, row("Pending", &["home"]).status(ProcessingStatus::Pending).build());
        insert(&db, row("Expired", &["home"]).timer(1, 1_000).build());
        db.set_active(1, false).unwrap();
        assert_eq!(id, 2);

        assert!(db.list_page("home", None, Pagination::default()).unwrap().is_empty());
        assert_eq!(db.search(None, None, Pagination::admin(None, None)).unwrap().len(), 3);
    }

    #[test]
    fn test_category_filter_and_all() {
        let db = db();
        insert(&db, row("Phone", &["home"]).category("Electronics & Gadgets").build());
        insert(&db, row("Shirt", &["home"]).category("Fashion & Accessories").build());

        let filtered = db
            .list_page("home", Some("electronics & gadgets"), Pagination::default())
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(db.list_page("home", Some("all"), Pagination::default()).unwrap().len(), 2);
        assert_eq!(
            db.page_categories("home").unwrap(),
            vec!["Electronics & Gadgets", "Fashion & Accessories"]
        );
    }

    #[test]
    fn test_list_by_category() {
        let db = db();
        insert(&db, row("On page", &["loot-box"]).category("Home & Living").build());
        insert(&db, row("No pages", &[]).category("Home & Living").build());
        insert(&db, row("Elsewhere", &["prime-picks"]).category("Home & Living").build());

        let on_loot_box = db
            .list_by_category("Home & Living", "loot-box", Pagination::default())
            .unwrap();
        assert_eq!(on_loot_box.len(), 2);
        assert_eq!(
            db.list_by_category("Home & Living", "all", Pagination::default())
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_list_by_page_type_ordering() {
        let db = db();
        insert(&db, row("Low", &["services"]).page_type("services").display_order(1).build());
        insert(&db, row("High", &["services"]).page_type("services").display_order(5).build());
        insert(&db, row("Other", &["apps"]).page_type("apps").build());

        let items = db
            .list_by_page_type("services", None, None, Pagination::default())
            .unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["High", "Low"]);

        let featured = db
            .list_by_page_type("services", None, Some(true), Pagination::default())
            .unwrap();
        assert!(featured.is_empty());
    }

    #[test]
    fn test_services_and_apps_are_inclusive() {
        let db = db();
        insert(&db, row("Typed", &["home"]).content_type(ContentType::Service).build());
        insert(&db, row("Categorized", &["home"]).category("Cloud Services").build());
        insert(&db, row("App", &["home"]).content_type(ContentType::App).build());

        assert_eq!(db.list_services().unwrap().len(), 2);
        assert_eq!(db.list_apps().unwrap().len(), 1);
    }

    #[test]
    fn test_search_and_pagination() {
        let db = db();
        for i in 0..5 {
            insert(&db, row(&format!("Mixer {}", i), &["home"]).build());
        }
        insert(&db, row("Kettle", &["home"]).build());

        let found = db
            .search(None, Some("mixer"), Pagination::admin(Some(2), Some(1)))
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|i| i.title.starts_with("Mixer")));

        db.set_active(1, false).unwrap();
        let visible = db
            .search_visible(None, Some("MIXER"), Pagination::admin(None, None))
            .unwrap();
        assert_eq!(visible.len(), 4);
    }

    #[test]
    fn test_search_matches_wildcards_literally() {
        let db = db();
        insert(&db, row("Flat 50% off Kettle", &["home"]).build());
        insert(&db, row("Kettle 500W", &["home"]).build());
        insert(&db, row("usb_c cable", &["home"]).build());
        insert(&db, row("usbxc cable", &["home"]).build());

        let admin = Pagination::admin(None, None);
        let percent = db.search(None, Some("50%"), admin).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "Flat 50% off Kettle");

        let underscore = db.search(None, Some("usb_c"), admin).unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].title, "usb_c cable");

        assert_eq!(db.search(None, Some("%"), admin).unwrap().len(), 1);
        assert_eq!(escape_like(r"a\b_c%"), r"a\\b\_c\%");
    }

    #[test]
    fn test_overflowing_timer_does_not_break_listings() {
        let db = db();
        insert(
            &db,
            row("Forever", &["home"]).timer(i64::MAX / 1000, 1_700_000_000).build(),
        );
        insert(&db, row("Plain", &["home"]).build());

        assert_eq!(db.list_page("home", None, Pagination::default()).unwrap().len(), 2);
        assert!(db.page_categories("home").is_ok());
        assert!(db.stats().is_ok());
        assert!(db.get_content(1).unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let db = db();
        insert(&db, row("A", &["home"]).flags(true, false, false).build());
        insert(&db, row("B", &["home"]).status(ProcessingStatus::Failed).build());

        let stats = db.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.featured, 1);
        assert_eq!(stats.by_source.get("manual"), Some(&2));
        assert_eq!(stats.channel_posts, 0);
    }
}
