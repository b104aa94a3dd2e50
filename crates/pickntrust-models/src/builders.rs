//! Builder patterns for complex types.

use crate::content::{ContentType, NewContent, ProcessingStatus, SourceType};
use crate::pages::DisplayPages;

/// Builder for creating `NewContent` rows with a fluent API.
#[derive(Debug, Clone)]
pub struct ContentBuilder {
    content: NewContent,
}

impl ContentBuilder {
    /// Creates a new ContentBuilder with required fields.
    pub fn new(title: impl Into<String>, affiliate_url: impl Into<String>) -> Self {
        Self {
            content: NewContent {
                title: title.into(),
                affiliate_url: affiliate_url.into(),
                ..NewContent::default()
            },
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.content.description = Some(description.into());
        self
    }

    /// Sets the current price.
    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.content.price = Some(price.into());
        self
    }

    /// Sets the price before discount.
    pub fn original_price(mut self, price: impl Into<String>) -> Self {
        self.content.original_price = Some(price.into());
        self
    }

    /// Sets the image URL.
    pub fn image_url(mut self, url: impl Into<String>) -> Self {
        self.content.image_url = Some(url.into());
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content.content_type = content_type;
        self
    }

    /// Sets the page type.
    pub fn page_type(mut self, page_type: impl Into<String>) -> Self {
        self.content.page_type = Some(page_type.into());
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.content.category = Some(category.into());
        self
    }

    /// Sets the subcategory.
    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.content.subcategory = Some(subcategory.into());
        self
    }

    /// Sets the source type and source id.
    pub fn source(mut self, source_type: SourceType, source_id: impl Into<String>) -> Self {
        self.content.source_type = source_type.as_str().to_string();
        self.content.source_id = Some(source_id.into());
        self
    }

    /// Sets the affiliate platform.
    pub fn affiliate_platform(mut self, platform: impl Into<String>) -> Self {
        self.content.affiliate_platform = Some(platform.into());
        self
    }

    /// Sets rating and review count.
    pub fn rating(mut self, rating: impl Into<String>, review_count: i64) -> Self {
        self.content.rating = Some(rating.into());
        self.content.review_count = Some(review_count);
        self
    }

    /// Sets the discount percentage.
    pub fn discount(mut self, discount: i64) -> Self {
        self.content.discount = Some(discount);
        self
    }

    /// Sets the flags driving the virtual pages.
    pub fn flags(mut self, featured: bool, service: bool, ai_app: bool) -> Self {
        self.content.is_featured = featured;
        self.content.is_service = service;
        self.content.is_ai_app = ai_app;
        self
    }

    /// Sets the display order.
    pub fn display_order(mut self, order: i64) -> Self {
        self.content.display_order = order;
        self
    }

    /// Sets the display pages.
    pub fn display_pages(mut self, pages: DisplayPages) -> Self {
        self.content.display_pages = pages;
        self
    }

    /// Adds a countdown timer of `hours` starting at `start` (unix seconds).
    pub fn timer(mut self, hours: i64, start: i64) -> Self {
        self.content.has_timer = true;
        self.content.timer_duration = Some(hours);
        self.content.timer_start_time = Some(start);
        self
    }

    /// Sets the processing status.
    pub fn status(mut self, status: ProcessingStatus) -> Self {
        self.content.processing_status = Some(status);
        self
    }

    /// Builds the row.
    pub fn build(self) -> NewContent {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let row = ContentBuilder::new("Mi Power Bank", "https://amzn.to/x").build();
        assert_eq!(row.title, "Mi Power Bank");
        assert_eq!(row.currency, "INR");
        assert_eq!(row.processing_status, Some(ProcessingStatus::Active));
    }

    #[test]
    fn test_builder_chain() {
        let row = ContentBuilder::new("Goa Flight Sale", "https://makemytrip.com/flights")
            .content_type(ContentType::Travel)
            .category("Travel")
            .subcategory("Flights")
            .source(SourceType::Telegram, "42")
            .flags(false, true, false)
            .display_pages(DisplayPages::from_slugs(["travel-picks", "flights"]))
            .timer(24, 1_700_000_000)
            .build();

        assert_eq!(row.content_type, ContentType::Travel);
        assert_eq!(row.source_type, "telegram");
        assert_eq!(row.source_id.as_deref(), Some("42"));
        assert!(row.is_service);
        assert!(row.has_timer);
        assert_eq!(row.timer_duration, Some(24));
        assert!(row.display_pages.matches("flights"));
    }
}
