//! E-commerce platform detection.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::patterns::{host_matches, host_of};

/// Store a product link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Amazon,
    Flipkart,
    Myntra,
    Nykaa,
    Ajio,
    Snapdeal,
    Boat,
    Mamaearth,
    TataNeu,
    Deodap,
    Generic,
}

/// Host suffixes per platform, including their shorteners.
const HOSTS: &[(Platform, &[&str])] = &[
    (Platform::Amazon, &["amazon.in", "amazon.com", "amzn.to", "amzn.in", "a.co"]),
    (Platform::Flipkart, &["flipkart.com", "fkrt.it", "fkrt.cc"]),
    (Platform::Myntra, &["myntra.com", "myntr.it"]),
    (Platform::Nykaa, &["nykaa.com", "nykaafashion.com"]),
    (Platform::Ajio, &["ajio.com"]),
    (Platform::Snapdeal, &["snapdeal.com"]),
    (Platform::Boat, &["boat-lifestyle.com"]),
    (Platform::Mamaearth, &["mamaearth.in"]),
    (Platform::TataNeu, &["tataneu.com", "tatacliq.com"]),
    (Platform::Deodap, &["deodap.in", "deodap.com"]),
];

static AMAZON_ASIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:dp|gp/product|gp/aw/d|product)/([A-Z0-9]{10})").expect("Invalid ASIN regex")
});

static FLIPKART_PID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/p/(itm[a-zA-Z0-9]+)|[?&]pid=([A-Z0-9]+)").expect("Invalid Flipkart regex")
});

static MYNTRA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)/buy").expect("Invalid Myntra regex"));

static GENERIC_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:product|item)[-_/](\w+)").expect("Invalid product id regex")
});

impl Platform {
    /// Detects the platform from a URL's host.
    pub fn detect(url: &str) -> Self {
        let Some(host) = host_of(url) else {
            return Platform::Generic;
        };
        HOSTS
            .iter()
            .find(|(_, domains)| domains.iter().any(|d| host_matches(&host, d)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Generic)
    }

    /// Returns the lower-case identifier stored with content rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Myntra => "myntra",
            Platform::Nykaa => "nykaa",
            Platform::Ajio => "ajio",
            Platform::Snapdeal => "snapdeal",
            Platform::Boat => "boat",
            Platform::Mamaearth => "mamaearth",
            Platform::TataNeu => "tataneu",
            Platform::Deodap => "deodap",
            Platform::Generic => "generic",
        }
    }

    /// Human-readable store name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Amazon => "Amazon",
            Platform::Flipkart => "Flipkart",
            Platform::Myntra => "Myntra",
            Platform::Nykaa => "Nykaa",
            Platform::Ajio => "AJIO",
            Platform::Snapdeal => "Snapdeal",
            Platform::Boat => "boAt",
            Platform::Mamaearth => "Mamaearth",
            Platform::TataNeu => "Tata Neu",
            Platform::Deodap => "DeoDap",
            Platform::Generic => "Online Store",
        }
    }

    /// Extracts the store's product id from a product URL.
    pub fn product_id(&self, url: &str) -> Option<String> {
        let caps = match self {
            Platform::Amazon => AMAZON_ASIN.captures(url),
            Platform::Flipkart => FLIPKART_PID.captures(url),
            Platform::Myntra => MYNTRA_ID.captures(url),
            Platform::Generic => GENERIC_ID.captures(url),
            _ => None,
        }?;
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().to_string())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Platform::detect("https://www.amazon.in/dp/B0CX23V2ZK"), Platform::Amazon);
        assert_eq!(Platform::detect("https://amzn.to/3abc"), Platform::Amazon);
        assert_eq!(Platform::detect("https://dl.flipkart.com/s/abc"), Platform::Flipkart);
        assert_eq!(Platform::detect("https://fkrt.it/xyz"), Platform::Flipkart);
        assert_eq!(Platform::detect("https://www.boat-lifestyle.com/x"), Platform::Boat);
        assert_eq!(Platform::detect("https://deodap.in/products/jar"), Platform::Deodap);
        assert_eq!(Platform::detect("https://example.com/x"), Platform::Generic);
        assert_eq!(Platform::detect("garbage"), Platform::Generic);
    }

    #[test]
    fn test_product_ids() {
        assert_eq!(
            Platform::Amazon.product_id("https://www.amazon.in/Boat-Airdopes/dp/B0CX23V2ZK?tag=x"),
            Some("B0CX23V2ZK".to_string())
        );
        assert_eq!(
            Platform::Amazon.product_id("https://www.amazon.in/gp/product/B07XJ8C8F5"),
            Some("B07XJ8C8F5".to_string())
        );
        assert_eq!(
            Platform::Flipkart.product_id("https://www.flipkart.com/boat-rockerz/p/itmabc123?pid=ACCF"),
            Some("itmabc123".to_string())
        );
        assert_eq!(
            Platform::Myntra.product_id("https://www.myntra.com/tshirts/roadster/12345678/buy"),
            Some("12345678".to_string())
        );
        assert_eq!(
            Platform::Generic.product_id("https://shop.example.com/product-abc42"),
            Some("abc42".to_string())
        );
        assert_eq!(Platform::Nykaa.product_id("https://www.nykaa.com/x"), None);
    }
}
