//! Request DTOs for the API.

use pickntrust_core::standardize_category;
use pickntrust_models::{
    normalize_slug, ContentPatch, ContentType, DisplayPages, NewContent, ProcessingStatus,
    TIMER_HOURS,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// `?category&limit&offset` of page listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?page&limit&offset` of category listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    pub page: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?limit` of capped listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// `?category&search&limit&offset` of the admin product search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?category&featured&limit&offset` of unified content listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentListQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?password` accepted by admin routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordQuery {
    pub password: Option<String>,
}

/// Body of `POST /api/admin/auth` and of password-only admin requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordBody {
    pub password: Option<String>,
}

/// Body of flag toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRequest {
    #[serde(alias = "isFeatured", alias = "isActive", alias = "value")]
    pub enabled: bool,
    pub password: Option<String>,
}

/// Accepts `"499"`, `499` or `499.5`.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a JSON array of slugs or any legacy string shape.
fn pages_value<'de, D>(deserializer: D) -> std::result::Result<Option<DisplayPages>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(DisplayPages::from_slugs(
            items.iter().filter_map(|v| v.as_str()),
        )),
        Some(Value::String(s)) => Some(DisplayPages::parse(&s)),
        _ => None,
    })
}

/// Content fields sent by the admin panel, for both create and update.
///
/// Field names are camelCase; the snake_case spellings are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default, alias = "original_price", deserialize_with = "string_or_number")]
    pub original_price: Option<String>,
    #[serde(alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(alias = "affiliate_url")]
    pub affiliate_url: Option<String>,
    #[serde(alias = "content_type")]
    pub content_type: Option<String>,
    #[serde(alias = "page_type")]
    pub page_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(alias = "affiliate_platform")]
    pub affiliate_platform: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: Option<String>,
    #[serde(alias = "review_count")]
    pub review_count: Option<i64>,
    pub discount: Option<i64>,
    pub currency: Option<String>,
    pub gender: Option<String>,
    #[serde(alias = "is_active")]
    pub is_active: Option<bool>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
    #[serde(alias = "is_service")]
    pub is_service: Option<bool>,
    #[serde(alias = "is_ai_app")]
    pub is_ai_app: Option<bool>,
    #[serde(alias = "display_order")]
    pub display_order: Option<i64>,
    #[serde(default, alias = "display_pages", deserialize_with = "pages_value")]
    pub display_pages: Option<DisplayPages>,
    #[serde(alias = "has_timer")]
    pub has_timer: Option<bool>,
    #[serde(alias = "timer_duration")]
    pub timer_duration: Option<i64>,
    #[serde(alias = "timer_start_time")]
    pub timer_start_time: Option<i64>,
    #[serde(alias = "processing_status")]
    pub processing_status: Option<String>,
    /// Origin of a row posted by an automation client (`rss`, `bot`, ...).
    #[serde(alias = "source_type")]
    pub source_type: Option<String>,
    pub password: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ContentRequest {
    fn parsed_content_type(&self) -> Result<Option<ContentType>> {
        match self.content_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => ContentType::parse(raw)
                .map(Some)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown content type: {}", raw))),
            None => Ok(None),
        }
    }

    fn check_timer_duration(&self) -> Result<()> {
        match self.timer_duration {
            Some(hours) if !TIMER_HOURS.contains(&hours) => Err(ApiError::BadRequest(format!(
                "timerDuration must be between {} and {} hours",
                TIMER_HOURS.start(),
                TIMER_HOURS.end()
            ))),
            _ => Ok(()),
        }
    }

    /// Builds a row to insert, tagged with `source_type`.
    pub fn into_new_content(self, source_type: &str) -> Result<NewContent> {
        let content_type = self.parsed_content_type()?;
        self.check_timer_duration()?;
        let title = non_empty(self.title)
            .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;

        let is_service = self.is_service.unwrap_or(false);
        let is_ai_app = self.is_ai_app.unwrap_or(false);
        let content_type = content_type.unwrap_or(if is_ai_app {
            ContentType::App
        } else if is_service {
            ContentType::Service
        } else {
            ContentType::Product
        });

        let page_type = non_empty(self.page_type).map(|p| normalize_slug(&p));
        let display_pages = match (self.display_pages, &page_type) {
            (Some(pages), _) if !pages.is_empty() => pages,
            (_, Some(page_type)) => DisplayPages::single(page_type),
            _ => NewContent::default().display_pages,
        };
        let has_timer = self.has_timer.unwrap_or(false) && self.timer_duration.is_some();

        let defaults = NewContent::default();
        Ok(NewContent {
            title,
            description: non_empty(self.description),
            price: self.price,
            original_price: self.original_price,
            image_url: non_empty(self.image_url),
            affiliate_url: non_empty(self.affiliate_url).unwrap_or_default(),
            content_type,
            page_type,
            category: non_empty(self.category).map(|c| standardize_category(&c)),
            subcategory: non_empty(self.subcategory),
            source_type: source_type.to_string(),
            source_id: None,
            affiliate_platform: non_empty(self.affiliate_platform),
            rating: self.rating,
            review_count: self.review_count,
            discount: self.discount,
            currency: non_empty(self.currency).unwrap_or(defaults.currency),
            gender: non_empty(self.gender),
            is_active: self.is_active.unwrap_or(true),
            is_featured: self.is_featured.unwrap_or(false),
            is_service,
            is_ai_app,
            display_order: self.display_order.unwrap_or(0),
            display_pages,
            has_timer,
            timer_duration: self.timer_duration.filter(|_| has_timer),
            timer_start_time: self.timer_start_time.filter(|_| has_timer),
            processing_status: self
                .processing_status
                .as_deref()
                .map(ProcessingStatus::parse)
                .or(defaults.processing_status),
        })
    }

    /// Builds a partial update. Fields absent from the request are kept.
    pub fn into_patch(self) -> Result<ContentPatch> {
        let content_type = self.parsed_content_type()?;
        self.check_timer_duration()?;
        Ok(ContentPatch {
            title: non_empty(self.title),
            description: self.description,
            price: self.price,
            original_price: self.original_price,
            image_url: self.image_url,
            affiliate_url: non_empty(self.affiliate_url),
            content_type,
            page_type: non_empty(self.page_type).map(|p| normalize_slug(&p)),
            category: non_empty(self.category).map(|c| standardize_category(&c)),
            subcategory: self.subcategory,
            affiliate_platform: self.affiliate_platform,
            rating: self.rating,
            review_count: self.review_count,
            discount: self.discount,
            currency: non_empty(self.currency),
            gender: self.gender,
            is_active: self.is_active,
            is_featured: self.is_featured,
            is_service: self.is_service,
            is_ai_app: self.is_ai_app,
            display_order: self.display_order,
            display_pages: self.display_pages,
            has_timer: self.has_timer,
            timer_duration: self.timer_duration,
            timer_start_time: self.timer_start_time,
            processing_status: self.processing_status.as_deref().map(ProcessingStatus::parse),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_request_accepts_both_spellings() {
        let req: ContentRequest = serde_json::from_value(json!({
            "name": "Mixer",
            "price": 1299,
            "original_price": "2499",
            "affiliateUrl": "https://amzn.to/m",
            "displayPages": ["prime-picks", "Home"],
            "category": "home & kitchen"
        }))
        .unwrap();

        let content = req.into_new_content("admin_panel").unwrap();
        assert_eq!(content.title, "Mixer");
        assert_eq!(content.price.as_deref(), Some("1299"));
        assert_eq!(content.original_price.as_deref(), Some("2499"));
        assert_eq!(content.display_pages.as_slice(), &["prime-picks", "home"]);
        assert_eq!(content.category.as_deref(), Some("Kitchen & Dining"));
        assert_eq!(content.source_type, "admin_panel");
    }

    #[test]
    fn test_new_content_requires_title() {
        let req = ContentRequest::default();
        assert!(matches!(
            req.into_new_content("manual"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_page_type_becomes_display_page() {
        let req: ContentRequest = serde_json::from_value(json!({
            "title": "Notion AI",
            "page_type": "apps",
            "is_ai_app": true
        }))
        .unwrap();

        let content = req.into_new_content("manual").unwrap();
        assert_eq!(content.content_type, ContentType::App);
        assert_eq!(content.display_pages.as_slice(), &["apps"]);
    }

    #[test]
    fn test_timer_needs_duration() {
        let req: ContentRequest =
            serde_json::from_value(json!({"title": "Flash", "hasTimer": true})).unwrap();
        assert!(!req.into_new_content("manual").unwrap().has_timer);
    }

    #[test]
    fn test_timer_duration_out_of_range_rejected() {
        for hours in [0, -5, 8761, i64::MAX / 1000] {
            let req: ContentRequest = serde_json::from_value(
                json!({"title": "Flash", "hasTimer": true, "timerDuration": hours}),
            )
            .unwrap();
            assert!(matches!(
                req.clone().into_new_content("manual"),
                Err(ApiError::BadRequest(_))
            ));
            assert!(matches!(req.into_patch(), Err(ApiError::BadRequest(_))));
        }

        let req: ContentRequest =
            serde_json::from_value(json!({"title": "Flash", "hasTimer": true, "timerDuration": 8760}))
                .unwrap();
        assert_eq!(req.into_new_content("manual").unwrap().timer_duration, Some(8760));
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let req: ContentRequest =
            serde_json::from_value(json!({"title": "X", "contentType": "banner"})).unwrap();
        assert!(req.into_patch().is_err());
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let req: ContentRequest =
            serde_json::from_value(json!({"price": "899", "password": "pw"})).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.price.as_deref(), Some("899"));
        assert!(patch.title.is_none());
        assert!(patch.display_pages.is_none());
    }
}
