//! Channel post ingestion.
//!
//! A post in a monitored channel becomes a `unified_content` row:
//! URLs are extracted, the first one is resolved and scraped, the result is
//! merged with what the message itself says, categorized for the channel's
//! page and stored with an affiliate link for the channel's network.

use std::sync::Arc;

use pickntrust_core::{
    caption_title, categorize, detect_travel, discount_from_prices, is_generic_title,
    parse_message, ChannelRegistry, ParsedMessage,
};
use pickntrust_links::{extract_urls, ConverterRegistry, FetchedProduct, Platform, ProductSource};
use pickntrust_models::pages::{HOME, TRAVEL_PICKS};
use pickntrust_models::{
    ChannelConfig, ContentBuilder, ContentId, ContentType, DisplayPages, NewChannelPost,
    NewContent, ProcessingStatus, SourceType, PLACEHOLDER_IMAGE,
};
use pickntrust_store::{ConversionRecord, Database, StoreError};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::message::IngestMessage;
use crate::notify::{processing_failed_alert, save_failed_alert, Notifier};
use crate::photo::photo_url;

/// Rating given to ingested products until real reviews exist.
pub const DEFAULT_RATING: &str = "4.0";

/// Review count shown alongside [`DEFAULT_RATING`].
pub const DEFAULT_REVIEW_COUNT: i64 = 100;

/// Why a message was not ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The chat is not a monitored channel.
    Unmonitored,
    /// The message has no links.
    NoUrls,
    /// The message was already ingested.
    Duplicate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unmonitored => write!(f, "unmonitored chat"),
            SkipReason::NoUrls => write!(f, "no URLs"),
            SkipReason::Duplicate => write!(f, "already ingested"),
        }
    }
}

/// Result of processing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored { content_id: ContentId, post_id: i64 },
    Skipped(SkipReason),
}

/// Product data after merging the message with the scraped page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MergedProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub discount: Option<i64>,
    pub image_url: String,
}

/// Merges message data with the scraped page.
///
/// Prices from the message win; the page fills what the message lacks. The
/// scraped title is used unless a photo caption has a better first line.
pub(crate) fn merge_product(
    parsed: &ParsedMessage,
    fetched: Option<&FetchedProduct>,
    msg: &IngestMessage,
    body: &str,
) -> MergedProduct {
    let page = fetched.and_then(|f| f.page.as_ref());

    let scraped_title = page
        .and_then(|p| p.title.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty() && !is_generic_title(t));
    let mut title = match scraped_title {
        Some(t) => t.to_string(),
        None => parsed.title.clone(),
    };
    if msg.has_photo() && (title.chars().count() < 20 || is_generic_title(&title)) {
        if let Some(line) = caption_title(body).filter(|l| l.chars().count() > 10) {
            title = line;
        }
    }

    let price = parsed.price.clone().or_else(|| page.and_then(|p| p.price.clone()));
    let original_price = parsed
        .original_price
        .clone()
        .or_else(|| page.and_then(|p| p.original_price.clone()));
    let discount = parsed.discount.or_else(|| match (&price, &original_price) {
        (Some(price), Some(original)) => discount_from_prices(price, original),
        _ => None,
    });
    let description = parsed
        .description
        .clone()
        .or_else(|| page.and_then(|p| p.description.clone()));

    let image_url = page
        .and_then(|p| p.image_url.as_deref())
        .filter(|url| !url.contains("placeholder"))
        .map(str::to_string)
        .or_else(|| msg.photo_file_id.as_deref().map(photo_url))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    MergedProduct {
        title,
        description,
        price,
        original_price,
        discount,
        image_url,
    }
}

/// Turns monitored channel posts into content rows.
#[derive(Clone)]
pub struct Ingestor {
    db: Arc<Database>,
    channels: Arc<ChannelRegistry>,
    source: Arc<dyn ProductSource>,
    converters: Arc<ConverterRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl Ingestor {
    /// Creates an ingestor with the built-in link converters.
    pub fn new(
        db: Arc<Database>,
        channels: Arc<ChannelRegistry>,
        source: Arc<dyn ProductSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db,
            channels,
            source,
            converters: Arc::new(ConverterRegistry::new()),
            notifier,
        }
    }

    /// Replaces the link converters.
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = Arc::new(converters);
        self
    }

    /// Returns the monitored channels.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Returns the store.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Processes one message.
    ///
    /// Errors after the post has been saved mark the post as failed and
    /// alert the admin chat before being returned.
    pub async fn process(&self, msg: &IngestMessage) -> Result<IngestOutcome> {
        let Some(channel) = self.channels.get(msg.chat_id) else {
            debug!(chat_id = msg.chat_id, "Ignoring message from unmonitored chat");
            return Ok(IngestOutcome::Skipped(SkipReason::Unmonitored));
        };

        let body = msg.body();
        let urls = extract_urls(&body);
        if urls.is_empty() {
            debug!(chat_id = msg.chat_id, message_id = msg.message_id, "No URLs in message");
            return Ok(IngestOutcome::Skipped(SkipReason::NoUrls));
        }

        if self.db.find_channel_post(msg.chat_id, msg.message_id)?.is_some() {
            debug!(chat_id = msg.chat_id, message_id = msg.message_id, "Message already ingested");
            return Ok(IngestOutcome::Skipped(SkipReason::Duplicate));
        }

        let post = NewChannelPost {
            channel_id: msg.chat_id,
            channel_name: msg
                .chat_title
                .clone()
                .unwrap_or_else(|| channel.page_name.clone()),
            website_page: channel.page_slug.clone(),
            message_id: msg.message_id,
            original_text: body.clone(),
            extracted_urls: urls.clone(),
            image_url: msg.photo_file_id.as_deref().map(photo_url),
            telegram_timestamp: Some(msg.date),
        };
        let post_id = match self.db.insert_channel_post(&post) {
            Ok(id) => id,
            Err(StoreError::Conflict(_)) => {
                return Ok(IngestOutcome::Skipped(SkipReason::Duplicate));
            }
            Err(e) => {
                self.notifier
                    .alert(&save_failed_alert(
                        &channel.page_name,
                        msg.chat_id,
                        msg.message_id,
                        &e.to_string(),
                    ))
                    .await;
                return Err(e.into());
            }
        };
        info!(post_id, channel = %channel.page_slug, urls = urls.len(), "Saved channel post");

        match self.store_product(channel, msg, &body, &urls, post_id).await {
            Ok((content_id, title, image_url)) => {
                self.db.mark_channel_post(post_id, Some(&title), true, None)?;
                if post.image_url.is_none() && image_url != PLACEHOLDER_IMAGE {
                    if let Err(e) = self.db.set_channel_post_image(post_id, &image_url) {
                        warn!(post_id, error = %e, "Failed to record post image");
                    }
                }
                info!(post_id, content_id, page = %channel.page_slug, "Ingested product");
                Ok(IngestOutcome::Stored { content_id, post_id })
            }
            Err(e) => {
                let error = e.to_string();
                if let Err(mark_err) = self.db.mark_channel_post(post_id, None, false, Some(&error)) {
                    warn!(post_id, error = %mark_err, "Failed to record processing error");
                }
                self.notifier
                    .alert(&processing_failed_alert(
                        &channel.page_name,
                        msg.chat_id,
                        msg.message_id,
                        &error,
                    ))
                    .await;
                Err(e)
            }
        }
    }

    async fn store_product(
        &self,
        channel: &ChannelConfig,
        msg: &IngestMessage,
        body: &str,
        urls: &[String],
        post_id: i64,
    ) -> Result<(ContentId, String, String)> {
        let posted_url = &urls[0];
        let parsed = parse_message(body);

        let fetched = match self.source.fetch(posted_url).await {
            Ok(fetched) => Some(fetched),
            Err(e) => {
                warn!(url = %posted_url, error = %e, "Product fetch failed, using message data");
                None
            }
        };
        let resolved_url = fetched
            .as_ref()
            .map(|f| f.resolved.final_url.clone())
            .unwrap_or_else(|| posted_url.clone());
        let platform = fetched
            .as_ref()
            .map(|f| f.resolved.platform)
            .unwrap_or_else(|| Platform::detect(&resolved_url));

        let merged = merge_product(&parsed, fetched.as_ref(), msg, body);

        let link_target = if channel.convert_links {
            resolved_url.as_str()
        } else {
            posted_url.as_str()
        };
        let conversion = self.converters.convert(link_target, channel);
        let network = conversion.network.unwrap_or(channel.network);
        self.db.record_conversion(&ConversionRecord {
            channel_post_id: Some(post_id),
            original_url: &conversion.original_url,
            affiliate_url: &conversion.affiliate_url,
            platform: Some(platform.as_str()),
            error: None,
        })?;

        let content = build_content(
            channel,
            merged,
            &conversion.affiliate_url,
            network.as_str(),
            platform,
            body,
            &resolved_url,
            post_id,
        );
        let title = content.title.clone();
        let image_url = content.image_url.clone().unwrap_or_default();
        let content_id = self.db.insert_content(&content)?;
        Ok((content_id, title, image_url))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_content(
    channel: &ChannelConfig,
    merged: MergedProduct,
    affiliate_url: &str,
    network: &str,
    platform: Platform,
    body: &str,
    resolved_url: &str,
    post_id: i64,
) -> NewContent {
    let mut description = merged.description.unwrap_or_default();

    let mut builder = ContentBuilder::new(merged.title.clone(), affiliate_url)
        .image_url(merged.image_url)
        .page_type(channel.page_slug.clone())
        .source(SourceType::Telegram, post_id.to_string())
        .affiliate_platform(network)
        .rating(DEFAULT_RATING, DEFAULT_REVIEW_COUNT)
        .status(ProcessingStatus::Active);

    if channel.page_slug == TRAVEL_PICKS {
        let detection = detect_travel(body, Some(resolved_url));
        if let Some(route) = &detection.route {
            if description.is_empty() {
                description = format!("Route: {}", route);
            } else {
                description = format!("{}\nRoute: {}", description, route);
            }
        }
        let mut pages = DisplayPages::from_slugs([TRAVEL_PICKS, HOME]);
        if let Some(slug) = detection.subcategory_slug() {
            pages.push(&slug);
        }
        debug!(subcategory = %detection.subcategory, from = ?detection.detected_from, "Detected travel deal");
        builder = builder
            .content_type(ContentType::Travel)
            .category(pickntrust_core::travel::TRAVEL_CATEGORY)
            .subcategory(detection.subcategory)
            .display_pages(pages);
    } else {
        let cat = categorize(&merged.title, &description, &channel.page_slug, platform.as_str());
        debug!(category = %cat.category, confidence = cat.confidence, "Categorized product");
        let content_type = if cat.is_ai_app {
            ContentType::App
        } else {
            ContentType::Product
        };
        builder = builder
            .content_type(content_type)
            .category(cat.category)
            .flags(cat.is_featured, cat.is_service, cat.is_ai_app)
            .display_pages(cat.display_pages);
    }

    if !description.is_empty() {
        builder = builder.description(description);
    }
    if let Some(price) = merged.price {
        builder = builder.price(price);
    }
    if let Some(original) = merged.original_price {
        builder = builder.original_price(original);
    }
    if let Some(discount) = merged.discount {
        builder = builder.discount(discount);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickntrust_links::{ProductPage, ResolvedUrl};

    fn fetched(title: Option<&str>, price: Option<&str>, image: Option<&str>) -> FetchedProduct {
        let url = "https://www.amazon.in/dp/B0CX23V2ZK";
        FetchedProduct {
            resolved: ResolvedUrl::unresolved(url),
            page: Some(ProductPage {
                url: url.to_string(),
                title: title.map(str::to_string),
                description: Some("Scraped description".to_string()),
                price: price.map(str::to_string),
                original_price: Some("2999".to_string()),
                image_url: image.map(str::to_string),
                platform: Some(Platform::Amazon),
            }),
        }
    }

    #[test]
    fn test_message_prices_win() {
        let body = "boAt Airdopes 141 TWS Earbuds\nDeal @ ₹999\nhttps://amzn.to/abc";
        let parsed = parse_message(body);
        let msg = IngestMessage::text(-1, 1, body);
        let merged = merge_product(
            &parsed,
            Some(&fetched(Some("boAt Airdopes 141 Bluetooth Truly Wireless"), Some("1099"), None)),
            &msg,
            body,
        );

        assert_eq!(merged.title, "boAt Airdopes 141 Bluetooth Truly Wireless");
        assert_eq!(merged.price.as_deref(), Some("999"));
        assert_eq!(merged.original_price.as_deref(), Some("2999"));
        assert_eq!(merged.discount, Some(67));
        assert_eq!(merged.image_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_image_falls_back_to_photo_proxy() {
        let body = "Philips Air Fryer HD9252 with Rapid Air\nhttps://amzn.to/abc";
        let parsed = parse_message(body);
        let msg = IngestMessage {
            caption: Some(body.to_string()),
            photo_file_id: Some("AgADBAAD".to_string()),
            ..IngestMessage::default()
        };
        let merged = merge_product(
            &parsed,
            Some(&fetched(None, None, Some("https://via.placeholder.com/300"))),
            &msg,
            body,
        );

        assert_eq!(merged.image_url, "/api/telegram/photo/AgADBAAD");
        assert_eq!(merged.title, "Philips Air Fryer HD9252 with Rapid Air");
    }

    #[test]
    fn test_scraped_image_wins() {
        let body = "Deal https://amzn.to/abc";
        let parsed = parse_message(body);
        let msg = IngestMessage::text(-1, 1, body);
        let merged = merge_product(
            &parsed,
            Some(&fetched(None, None, Some("https://m.media-amazon.com/images/I/x.jpg"))),
            &msg,
            body,
        );
        assert_eq!(merged.image_url, "https://m.media-amazon.com/images/I/x.jpg");
        let expected = parsed
            .description
            .clone()
            .unwrap_or_else(|| "Scraped description".to_string());
        assert_eq!(merged.description.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_travel_content() {
        let channel = ChannelRegistry::defaults()
            .by_page(TRAVEL_PICKS)
            .cloned()
            .unwrap();
        let body = "Delhi to Goa flights from ₹2,499\nhttps://www.makemytrip.com/flights/";
        let merged = MergedProduct {
            title: "Delhi to Goa flights".to_string(),
            description: None,
            price: Some("2499".to_string()),
            original_price: None,
            discount: None,
            image_url: PLACEHOLDER_IMAGE.to_string(),
        };
        let content = build_content(
            &channel,
            merged,
            "https://linksredirect.com/?url=x",
            "cuelinks",
            Platform::Generic,
            body,
            "https://www.makemytrip.com/flights/",
            9,
        );

        assert_eq!(content.content_type, ContentType::Travel);
        assert_eq!(content.category.as_deref(), Some("Travel"));
        assert_eq!(content.subcategory.as_deref(), Some("Flights"));
        assert!(content.display_pages.matches("travel-picks"));
        assert!(content.display_pages.matches("home"));
        assert!(content.display_pages.matches("flights"));
        assert!(content.description.unwrap_or_default().contains("Route: Delhi → Goa"));
        assert_eq!(content.source_id.as_deref(), Some("9"));
        assert_eq!(content.rating.as_deref(), Some(DEFAULT_RATING));
    }
}
