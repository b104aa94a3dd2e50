//! Link handling for PickNTrust.
//!
//! Turns the links found in deal posts into affiliate links and product data:
//!
//! - **patterns**: URL extraction and shortener detection
//! - **platform**: Store detection and product ids
//! - **affiliate**: Cleaning and per-network conversion
//! - **resolver**: Redirect chain resolution
//! - **scraper**: Product page extraction
//! - **source**: The `ProductSource` seam used by the ingestion pipeline

pub mod affiliate;
pub mod error;
pub mod patterns;
pub mod platform;
pub mod resolver;
pub mod scraper;
pub mod source;

pub use affiliate::{
    clean_affiliate_url, is_affiliate_url, AmazonConverter, Conversion, ConverterRegistry,
    CuelinksConverter, DeodapConverter, EarnkaroConverter, InrdealsConverter, LinkConverter,
};
pub use error::{LinkError, Result};
pub use patterns::{extract_urls, host_of, is_shortened, Pattern, SHORTENER_DOMAINS};
pub use platform::Platform;
pub use resolver::{ResolvedUrl, UrlResolver};
pub use scraper::{parse_product_page, ProductPage, ProductScraper};
pub use source::{FetchedProduct, OfflineProductSource, ProductSource, WebProductSource};
