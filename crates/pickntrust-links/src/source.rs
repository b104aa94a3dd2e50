//! Product sources used by the ingestion pipeline.

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::resolver::{ResolvedUrl, UrlResolver};
use crate::scraper::{ProductPage, ProductScraper};

/// A fetched product with the redirect resolution that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedProduct {
    pub resolved: ResolvedUrl,
    /// `None` when the page could not be scraped.
    pub page: Option<ProductPage>,
}

/// Something that can look up product data for a link.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Resolves `url` and fetches its product data.
    async fn fetch(&self, url: &str) -> Result<FetchedProduct>;
}

/// Live web source: follows redirects, then scrapes the destination.
#[derive(Clone)]
pub struct WebProductSource {
    resolver: UrlResolver,
    scraper: ProductScraper,
}

impl WebProductSource {
    /// Creates a web source with default HTTP settings.
    pub fn new() -> Result<Self> {
        Ok(Self {
            resolver: UrlResolver::new()?,
            scraper: ProductScraper::new()?,
        })
    }
}

#[async_trait]
impl ProductSource for WebProductSource {
    async fn fetch(&self, url: &str) -> Result<FetchedProduct> {
        let resolved = match self.resolver.resolve(url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(url, error = %e, "Redirect resolution failed, scraping the posted URL");
                ResolvedUrl::unresolved(url)
            }
        };

        let page = match self.scraper.scrape(&resolved.final_url).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(url = %resolved.final_url, error = %e, "Product scrape failed");
                None
            }
        };

        Ok(FetchedProduct { resolved, page })
    }
}

/// Source that never touches the network; every link resolves to itself.
#[derive(Debug, Clone, Default)]
pub struct OfflineProductSource;

#[async_trait]
impl ProductSource for OfflineProductSource {
    async fn fetch(&self, url: &str) -> Result<FetchedProduct> {
        Ok(FetchedProduct {
            resolved: ResolvedUrl::unresolved(url),
            page: None,
        })
    }
}
