//! Product page scraping.
//!
//! Extraction works on raw HTML with regexes: store specific markup first,
//! then OpenGraph/product meta tags, then JSON-LD and loose rupee amounts.

use std::sync::LazyLock;

use pickntrust_models::MAX_PRICE;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::platform::Platform;
use crate::resolver::build_client;

/// Product data scraped from a store page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    /// URL the page was fetched from.
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Plain decimal string, e.g. "1299".
    pub price: Option<String>,
    pub original_price: Option<String>,
    pub image_url: Option<String>,
    pub platform: Option<Platform>,
}

impl ProductPage {
    /// Returns true if nothing useful was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.image_url.is_none()
    }
}

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("Invalid meta regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid attribute regex")
});

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("Invalid title regex"));

static JSON_LD_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""price"\s*:\s*"?([\d,]+(?:\.\d+)?)"#).expect("Invalid JSON-LD regex")
});

static RUPEE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"₹\s*([\d,]+(?:\.\d+)?)").expect("Invalid rupee regex"));

static MRP_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)M\.?R\.?P\.?\s*:?\s*(?:₹|Rs\.?|&#8377;)\s*([\d,]+(?:\.\d+)?)").expect("Invalid MRP regex")
});

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x?)([0-9a-fA-F]+);").expect("Invalid entity regex"));

/// Store specific markup, tried before the generic meta tags.
struct Selectors {
    title: &'static [&'static str],
    price: &'static [&'static str],
    original_price: &'static [&'static str],
    image: &'static [&'static str],
}

static AMAZON: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    compile(&Selectors {
        title: &[r#"(?s)id="productTitle"[^>]*>(.*?)</span>"#],
        price: &[
            r#"(?s)class="a-price[^"]*"[^>]*>\s*<span class="a-offscreen">\s*₹?\s*([\d,]+(?:\.\d+)?)"#,
            r#"class="a-price-whole">([\d,]+)"#,
        ],
        original_price: &[
            r#"(?s)class="a-price a-text-price"[^>]*>\s*<span class="a-offscreen">\s*₹?\s*([\d,]+(?:\.\d+)?)"#,
        ],
        image: &[
            r#"id="landingImage"[^>]*data-old-hires="([^"]+)""#,
            r#"id="landingImage"[^>]*src="([^"]+)""#,
        ],
    })
});

static FLIPKART: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    compile(&Selectors {
        title: &[
            r#"(?s)class="(?:B_NuCI|VU-ZEz)"[^>]*>(.*?)</span>"#,
        ],
        price: &[r#"class="(?:_30jeq3[^"]*|Nx9bqj[^"]*)">₹([\d,]+)"#],
        original_price: &[r#"class="(?:_3I9_wc[^"]*|yRaY8j[^"]*)">₹?([\d,]+)"#],
        image: &[r#"class="(?:_396cs4[^"]*|DByuf4[^"]*)"[^>]*src="([^"]+)""#],
    })
});

static MYNTRA: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    compile(&Selectors {
        title: &[r#"(?s)class="pdp-name"[^>]*>(.*?)</h1>"#, r#"(?s)class="pdp-title"[^>]*>(.*?)</h1>"#],
        price: &[r#"(?s)class="pdp-price"[^>]*>.*?₹\s*([\d,]+)"#],
        original_price: &[r#"(?s)class="pdp-mrp"[^>]*>.*?₹\s*([\d,]+)"#],
        image: &[],
    })
});

fn compile(selectors: &Selectors) -> Vec<Vec<Regex>> {
    [selectors.title, selectors.price, selectors.original_price, selectors.image]
        .iter()
        .map(|patterns| {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("Invalid selector regex"))
                .collect()
        })
        .collect()
}

fn selectors_for(platform: Platform) -> Option<&'static Vec<Vec<Regex>>> {
    match platform {
        Platform::Amazon => Some(&*AMAZON),
        Platform::Flipkart => Some(&*FLIPKART),
        Platform::Myntra => Some(&*MYNTRA),
        _ => None,
    }
}

fn first_capture(html: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .filter(|s| !s.is_empty())
    })
}

/// Decodes the HTML entities common in store markup.
pub fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&rsquo;", "'")
        .replace("&ndash;", "-");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |caps: &regex::Captures| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric.replace("&amp;", "&")
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn clean_text(s: &str) -> String {
    decode_entities(&strip_tags(s))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a scraped price to a plain decimal string.
pub fn normalize_price(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.trim_matches('.').parse().ok()?;
    if value <= 0.0 || value > MAX_PRICE {
        return None;
    }
    if value.fract() == 0.0 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{:.2}", value))
    }
}

/// Returns the `content` of the first meta tag whose property or name is `key`.
fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut matched = false;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let name = caps[1].to_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match name.as_str() {
                "property" | "name" | "itemprop" if value.eq_ignore_ascii_case(key) => matched = true,
                "content" => content = Some(value.to_string()),
                _ => {}
            }
        }
        if matched {
            content.map(|c| clean_text(&c)).filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// Extracts product data from a page's HTML.
pub fn parse_product_page(html: &str, url: &str) -> ProductPage {
    let platform = Platform::detect(url);
    let selectors = selectors_for(platform);
    let pick = |index: usize| selectors.and_then(|s| first_capture(html, &s[index]));

    let title = pick(0)
        .or_else(|| meta_content(html, "og:title"))
        .or_else(|| meta_content(html, "twitter:title"))
        .or_else(|| {
            TITLE_TAG
                .captures(html)
                .map(|c| clean_text(&c[1]))
                .filter(|t| !t.is_empty())
        });

    let price = pick(1)
        .or_else(|| meta_content(html, "product:price:amount"))
        .or_else(|| meta_content(html, "og:price:amount"))
        .or_else(|| meta_content(html, "price"))
        .or_else(|| JSON_LD_PRICE.captures(html).map(|c| c[1].to_string()))
        .or_else(|| RUPEE_AMOUNT.captures(html).map(|c| c[1].to_string()))
        .and_then(|p| normalize_price(&p));

    let original_price = pick(2)
        .or_else(|| MRP_AMOUNT.captures(html).map(|c| c[1].to_string()))
        .and_then(|p| normalize_price(&p))
        .filter(|orig| {
            let parse = |s: &str| s.parse::<f64>().ok();
            match (parse(orig), price.as_deref().and_then(parse)) {
                (Some(o), Some(p)) => o > p,
                _ => true,
            }
        });

    let image_url = pick(3)
        .or_else(|| meta_content(html, "og:image"))
        .or_else(|| meta_content(html, "twitter:image"))
        .filter(|i| i.starts_with("http"));

    let description = meta_content(html, "og:description")
        .or_else(|| meta_content(html, "description"));

    ProductPage {
        url: url.to_string(),
        title,
        description,
        price,
        original_price,
        image_url,
        platform: Some(platform),
    }
}

/// Fetches store pages and extracts product data.
#[derive(Clone)]
pub struct ProductScraper {
    client: Client,
}

impl ProductScraper {
    /// Creates a scraper with a browser user agent and the default timeout.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client(true)?,
        })
    }

    /// Fetches and parses `url`.
    pub async fn scrape(&self, url: &str) -> Result<ProductPage> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-IN,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        let page = parse_product_page(&html, &final_url);
        if page.is_empty() {
            return Err(LinkError::EmptyPage(url.to_string()));
        }
        debug!(url = %final_url, title = ?page.title, price = ?page.price, "Scraped product page");
        Ok(page)
    }
}
