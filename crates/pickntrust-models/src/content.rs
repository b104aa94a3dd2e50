//! Unified content types.
//!
//! A single `unified_content` row represents anything the site displays:
//! products, services, AI apps, travel deals and videos.

use serde::{Deserialize, Serialize};

use crate::pages::DisplayPages;

/// Row id of a `unified_content` record.
pub type ContentId = i64;

/// Currency stored when none is given.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Image used when a row has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "/api/placeholder/300/300";

/// Largest price accepted from messages and product pages, in rupees.
pub const MAX_PRICE: f64 = 1e10;

/// Accepted timer lengths in hours (one hour up to one year).
pub const TIMER_HOURS: std::ops::RangeInclusive<i64> = 1..=8760;

/// Kind of content a row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Product,
    Service,
    App,
    Travel,
    Video,
}

impl ContentType {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Product => "product",
            ContentType::Service => "service",
            ContentType::App => "app",
            ContentType::Travel => "travel",
            ContentType::Video => "video",
        }
    }

    /// Parses a stored value, accepting the spellings older rows used.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "product" | "products" => Some(ContentType::Product),
            "service" | "services" => Some(ContentType::Service),
            "app" | "apps" | "ai-app" | "ai_app" | "ai-apps" => Some(ContentType::App),
            "travel" => Some(ContentType::Travel),
            "video" | "videos" => Some(ContentType::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Manual,
    Telegram,
    Rss,
    Api,
}

impl SourceType {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Telegram => "telegram",
            SourceType::Rss => "rss",
            SourceType::Api => "api",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of a row.
///
/// Only `active` and `completed` rows (and rows without a status) are shown
/// on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Active,
    Completed,
    Pending,
    Failed,
    Archived,
}

impl ProcessingStatus {
    /// Stored values that are visible on the site.
    pub const VISIBLE: [&'static str; 2] = ["active", "completed"];

    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Active => "active",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Archived => "archived",
        }
    }

    /// Parses a stored value. Unrecognized values are treated as pending.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" | "published" | "processed" => ProcessingStatus::Active,
            "completed" | "complete" | "done" => ProcessingStatus::Completed,
            "failed" | "error" => ProcessingStatus::Failed,
            "archived" | "expired" | "deleted" => ProcessingStatus::Archived,
            _ => ProcessingStatus::Pending,
        }
    }

    /// Returns true if rows with this status are displayed.
    pub fn is_visible(&self) -> bool {
        matches!(self, ProcessingStatus::Active | ProcessingStatus::Completed)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored `unified_content` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_url: String,
    pub content_type: ContentType,
    pub page_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub source_type: String,
    pub source_id: Option<String>,
    pub affiliate_platform: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<i64>,
    pub discount: Option<i64>,
    pub currency: String,
    pub gender: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_service: bool,
    pub is_ai_app: bool,
    pub display_order: i64,
    pub display_pages: DisplayPages,
    pub has_timer: bool,
    /// Timer length in hours.
    pub timer_duration: Option<i64>,
    /// Timer start as unix seconds.
    pub timer_start_time: Option<i64>,
    pub processing_status: Option<ProcessingStatus>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

impl ContentItem {
    /// Returns when the row's timer runs out, if it has a running timer.
    ///
    /// A timer whose end does not fit in an `i64` never runs out.
    pub fn timer_expires_at(&self) -> Option<i64> {
        if !self.has_timer {
            return None;
        }
        let hours = self.timer_duration?;
        let start = self.timer_start_time.unwrap_or(self.created_at);
        hours.checked_mul(3600).and_then(|secs| start.checked_add(secs))
    }

    /// Returns true if the row has a timer that ran out at or before `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.timer_expires_at().is_some_and(|at| at <= now)
    }

    /// Returns true if the row is shown on the site at `now`.
    pub fn is_visible(&self, now: i64) -> bool {
        self.is_active
            && self.processing_status.map_or(true, |s| s.is_visible())
            && !self.is_expired(now)
    }

    /// Returns the image to show, falling back to the placeholder.
    pub fn display_image(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}

/// A row to insert into `unified_content`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_url: String,
    pub content_type: ContentType,
    pub page_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub source_type: String,
    pub source_id: Option<String>,
    pub affiliate_platform: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<i64>,
    pub discount: Option<i64>,
    pub currency: String,
    pub gender: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_service: bool,
    pub is_ai_app: bool,
    pub display_order: i64,
    pub display_pages: DisplayPages,
    pub has_timer: bool,
    pub timer_duration: Option<i64>,
    pub timer_start_time: Option<i64>,
    pub processing_status: Option<ProcessingStatus>,
}

impl Default for NewContent {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            price: None,
            original_price: None,
            image_url: None,
            affiliate_url: String::new(),
            content_type: ContentType::Product,
            page_type: None,
            category: None,
            subcategory: None,
            source_type: SourceType::Manual.as_str().to_string(),
            source_id: None,
            affiliate_platform: None,
            rating: None,
            review_count: None,
            discount: None,
            currency: DEFAULT_CURRENCY.to_string(),
            gender: None,
            is_active: true,
            is_featured: false,
            is_service: false,
            is_ai_app: false,
            display_order: 0,
            display_pages: DisplayPages::single(crate::pages::HOME),
            has_timer: false,
            timer_duration: None,
            timer_start_time: None,
            processing_status: Some(ProcessingStatus::Active),
        }
    }
}

/// Partial update of a row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_url: Option<String>,
    pub content_type: Option<ContentType>,
    pub page_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub affiliate_platform: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<i64>,
    pub discount: Option<i64>,
    pub currency: Option<String>,
    pub gender: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_service: Option<bool>,
    pub is_ai_app: Option<bool>,
    pub display_order: Option<i64>,
    pub display_pages: Option<DisplayPages>,
    pub has_timer: Option<bool>,
    pub timer_duration: Option<i64>,
    pub timer_start_time: Option<i64>,
    pub processing_status: Option<ProcessingStatus>,
}

impl ContentPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == ContentPatch::default()
    }
}
