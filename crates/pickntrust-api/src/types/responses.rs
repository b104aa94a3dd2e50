//! Response DTOs for the API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pickntrust_models::{ChannelPost, ContentItem};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Whether the database answered.
    pub database: bool,
}

fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// A content row as the site renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub currency: String,
    pub image_url: String,
    pub affiliate_url: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<i64>,
    pub discount: Option<i64>,
    pub gender: Option<String>,
    pub content_type: String,
    pub page_type: Option<String>,
    pub display_pages: Vec<String>,
    pub affiliate_platform: Option<String>,
    pub source_type: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_service: bool,
    pub is_ai_app: bool,
    pub display_order: i64,
    pub has_timer: bool,
    /// Hours.
    pub timer_duration: Option<i64>,
    pub timer_start_time: Option<DateTime<Utc>>,
    pub processing_status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&ContentItem> for ProductResponse {
    fn from(item: &ContentItem) -> Self {
        // a timer is only reported when it can actually count down
        let has_timer = item.has_timer && item.timer_duration.is_some_and(|d| d > 0);
        Self {
            id: item.id,
            name: item.title.clone(),
            description: item.description.clone(),
            price: item.price.clone(),
            original_price: item.original_price.clone(),
            currency: item.currency.clone(),
            image_url: item.display_image().to_string(),
            affiliate_url: item.affiliate_url.clone(),
            category: item.category.clone(),
            subcategory: item.subcategory.clone(),
            rating: item.rating.clone(),
            review_count: item.review_count,
            discount: item.discount,
            gender: item.gender.clone(),
            content_type: item.content_type.as_str().to_string(),
            page_type: item.page_type.clone(),
            display_pages: item.display_pages.as_slice().to_vec(),
            affiliate_platform: item.affiliate_platform.clone(),
            source_type: item.source_type.clone(),
            is_active: item.is_active,
            is_featured: item.is_featured,
            is_service: item.is_service,
            is_ai_app: item.is_ai_app,
            display_order: item.display_order,
            has_timer,
            timer_duration: item.timer_duration.filter(|_| has_timer),
            timer_start_time: if has_timer {
                timestamp(item.timer_start_time.or(Some(item.created_at)))
            } else {
                None
            },
            processing_status: item.processing_status.map(|s| s.as_str().to_string()),
            created_at: timestamp(Some(item.created_at)),
            updated_at: timestamp(Some(item.updated_at)),
        }
    }
}

/// Converts rows for a listing response.
pub fn products(items: &[ContentItem]) -> Vec<ProductResponse> {
    items.iter().map(ProductResponse::from).collect()
}

/// Response to a create request.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    /// Id of the created row.
    pub id: i64,
    /// Human readable message.
    pub message: String,
    /// The created row.
    pub product: ProductResponse,
}

/// Generic success response.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
    /// Human readable message.
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// A stored channel post for the admin view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPostResponse {
    pub id: i64,
    pub channel_id: i64,
    pub channel_name: String,
    pub website_page: String,
    pub message_id: i64,
    pub original_text: String,
    pub extracted_urls: Vec<String>,
    pub image_url: Option<String>,
    pub is_processed: bool,
    pub is_posted: bool,
    pub processing_error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ChannelPost> for ChannelPostResponse {
    fn from(post: &ChannelPost) -> Self {
        Self {
            id: post.id,
            channel_id: post.channel_id,
            channel_name: post.channel_name.clone(),
            website_page: post.website_page.clone(),
            message_id: post.message_id,
            original_text: post.original_text.clone(),
            extracted_urls: post.extracted_urls.clone(),
            image_url: post.image_url.clone(),
            is_processed: post.is_processed,
            is_posted: post.is_posted,
            processing_error: post.processing_error.clone(),
            created_at: timestamp(Some(post.created_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_models::{DisplayPages, ProcessingStatus, PLACEHOLDER_IMAGE};

    fn item() -> ContentItem {
        ContentItem {
            id: 1,
            title: "Mixer".to_string(),
            description: None,
            price: Some("1299".to_string()),
            original_price: None,
            image_url: None,
            affiliate_url: "https://amzn.to/m".to_string(),
            content_type: Default::default(),
            page_type: None,
            category: None,
            subcategory: None,
            source_type: "telegram".to_string(),
            source_id: None,
            affiliate_platform: None,
            rating: None,
            review_count: None,
            discount: None,
            currency: "INR".to_string(),
            gender: None,
            is_active: true,
            is_featured: false,
            is_service: false,
            is_ai_app: false,
            display_order: 0,
            display_pages: DisplayPages::single("prime-picks"),
            has_timer: true,
            timer_duration: None,
            timer_start_time: None,
            processing_status: Some(ProcessingStatus::Active),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_product_response_is_camel_case() {
        let json = serde_json::to_value(ProductResponse::from(&item())).unwrap();
        assert_eq!(json["name"], "Mixer");
        assert_eq!(json["affiliateUrl"], "https://amzn.to/m");
        assert_eq!(json["imageUrl"], PLACEHOLDER_IMAGE);
        assert_eq!(json["displayPages"][0], "prime-picks");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_timer_without_duration_is_hidden() {
        let response = ProductResponse::from(&item());
        assert!(!response.has_timer);
        assert!(response.timer_start_time.is_none());

        let mut timed = item();
        timed.timer_duration = Some(24);
        let response = ProductResponse::from(&timed);
        assert!(response.has_timer);
        assert_eq!(response.timer_start_time, DateTime::from_timestamp(1_700_000_000, 0));
    }
}
