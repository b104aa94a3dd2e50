//! Deal message parser.
//!
//! Extracts a product title, prices, discount and a short description from
//! the free-form text of a deal post such as:
//!
//! ```text
//! 🔥 boAt Airdopes 141 Bluetooth Earbuds
//! Deal @ ₹999  Reg @ ₹4,490
//! 78% off
//! https://amzn.to/3xyz
//! ```
//!
//! Prices are returned as plain decimal strings (`"999"`, `"4490"`,
//! `"1500"` for `₹1.5k`).

use pickntrust_models::MAX_PRICE;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::text::{contains_term, strip_decorations, truncate_chars};

/// Title used when nothing better can be found.
pub const FALLBACK_TITLE: &str = "Product from Telegram";

/// Maximum description length in characters.
const DESCRIPTION_LIMIT: usize = 200;

const AMOUNT: &str = r"([\d,]+(?:\.\d+)?)(k\b)?";

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)\S+").expect("Invalid URL regex")
});

static PAIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"₹\s?([\d,]+(?:\.\d+)?)\s*₹\s?([\d,]+(?:\.\d+)?)").expect("Invalid pair regex")
});

static RUPEE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)₹\s?{AMOUNT}")).expect("Invalid rupee regex"));

static DEAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)deal\s*@\s*₹?\s?{AMOUNT}")).expect("Invalid deal regex")
});

static REG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)reg\s*@\s*₹?\s?{AMOUNT}")).expect("Invalid reg regex")
});

static PRICE_COLON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)price\s*:\s*₹?\s?{AMOUNT}")).expect("Invalid price regex")
});

static MRP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)mrp\s*:?\s*₹?\s?{AMOUNT}")).expect("Invalid MRP regex")
});

static PERCENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3})\s*%\s*(?:off|discount|save|savings)").expect("Invalid percent regex")
});

static SAVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)save\s*₹?\s?([\d,]+(?:\.\d+)?)").expect("Invalid save regex")
});

static ASIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").expect("Invalid ASIN regex"));

const PRODUCT_KEYWORDS: &[&str] = &[
    "headphones", "mouse", "watch", "laptop", "phone", "smartphone", "tablet", "camera",
    "speaker", "earbuds", "charger", "cable", "adapter", "keyboard", "monitor", "tv",
    "television", "gaming", "wireless", "bluetooth", "smart", "premium", "pro", "max", "mini",
    "ultra", "edition", "series", "model",
];

const PROMO_TERMS: &[&str] = &["off", "discount", "save", "limited", "flash sale"];

/// Structured data extracted from a deal message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub title: String,
    pub price: Option<String>,
    pub original_price: Option<String>,
    /// Discount percentage (1-100).
    pub discount: Option<i64>,
    pub description: Option<String>,
}

/// Parses a deal message.
pub fn parse_message(text: &str) -> ParsedMessage {
    let trimmed = text.trim();
    if is_url_only(trimmed) {
        return ParsedMessage {
            title: title_from_url(trimmed),
            description: Some(format!("Product available at: {}", trimmed)),
            ..Default::default()
        };
    }

    let lines: Vec<&str> = trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let title = extract_title(&lines);
    let (price, original_price) = extract_prices(trimmed);
    let discount = extract_discount(trimmed, price.as_deref(), original_price.as_deref());
    let description = extract_description(trimmed, &lines, &title);

    ParsedMessage {
        title,
        price,
        original_price,
        discount,
        description,
    }
}

/// Returns a caption's first meaningful line, for photo posts.
pub fn caption_title(caption: &str) -> Option<String> {
    caption
        .lines()
        .map(strip_decorations)
        .find(|line| !line.is_empty())
        .filter(|line| line.chars().count() >= 8 && !is_url_line(line) && !line.contains('₹'))
}

/// Returns true for titles that carry no product information.
pub fn is_generic_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty()
        || title == FALLBACK_TITLE
        || title.starts_with("Amazon Product")
        || matches!(title, "Flipkart Product" | "Myntra Product" | "Nykaa Product")
}

/// Computes a discount percentage from a price pair.
pub fn discount_from_prices(price: &str, original: &str) -> Option<i64> {
    let price: f64 = price.replace(',', "").trim().parse().ok()?;
    let original: f64 = original.replace(',', "").trim().parse().ok()?;
    if original <= 0.0 || original <= price {
        return None;
    }
    let percent = (((original - price) / original) * 100.0).round() as i64;
    (1..=100).contains(&percent).then_some(percent)
}

fn is_url_only(text: &str) -> bool {
    text.starts_with("http") && !text.contains(char::is_whitespace)
}

fn is_url_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.starts_with("http") || lower.starts_with("www.")
}

fn title_from_url(url: &str) -> String {
    let lower = url.to_lowercase();
    if lower.contains("amazon.") || lower.contains("amzn.to") {
        if let Some(keywords) = url::Url::parse(url).ok().and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "keywords")
                .map(|(_, v)| v.replace(['+', '_', '-'], " ").trim().to_string())
        }) {
            if !keywords.is_empty() {
                return keywords;
            }
        }
        return match ASIN_REGEX.captures(url) {
            Some(caps) => format!("Amazon Product {}", &caps[1]),
            None => "Amazon Product".to_string(),
        };
    }
    if lower.contains("flipkart.com") || lower.contains("fkrt.") {
        return "Flipkart Product".to_string();
    }
    if lower.contains("myntra.com") {
        return "Myntra Product".to_string();
    }
    if lower.contains("nykaa.com") {
        return "Nykaa Product".to_string();
    }
    FALLBACK_TITLE.to_string()
}

/// Lines that are prices, links or promotional noise rather than a name.
fn is_noise_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    is_url_line(line)
        || lower.contains("deal @")
        || lower.contains("reg @")
        || lower.contains("price:")
        || lower.contains("mrp")
        || line.contains('₹')
        || line.contains('%')
        || PROMO_TERMS.iter().any(|t| contains_term(&lower, t))
}

fn extract_title(lines: &[&str]) -> String {
    let cleaned: Vec<String> = lines.iter().map(|l| strip_decorations(l)).collect();

    let has_letters = |s: &str| s.chars().any(|c| c.is_alphabetic());

    // First line naming a product, or a descriptive line of reasonable length.
    for line in &cleaned {
        let len = line.chars().count();
        if len < 8 || is_noise_line(line) {
            continue;
        }
        let lower = line.to_lowercase();
        let has_keyword = PRODUCT_KEYWORDS.iter().any(|k| contains_term(&lower, k));
        let descriptive = len > 15 && len < 100 && has_letters(line);
        if has_keyword || descriptive {
            return line.clone();
        }
    }

    // Longest meaningful line.
    if let Some(longest) = cleaned
        .iter()
        .filter(|l| {
            let len = l.chars().count();
            len > 8 && len < 100 && !is_noise_line(l) && has_letters(l)
        })
        .max_by_key(|l| l.chars().count())
    {
        return longest.clone();
    }

    // First line, or the second when the first is unusable.
    let pick = cleaned.first().and_then(|first| {
        if first.chars().count() < 8 || is_url_line(first) || first.contains('₹') {
            cleaned
                .get(1)
                .filter(|second| !is_url_line(second) && !second.contains('₹'))
                .cloned()
        } else {
            Some(first.clone())
        }
    });

    match pick {
        Some(title) if title.chars().count() >= 3 => title,
        _ => FALLBACK_TITLE.to_string(),
    }
}

/// Normalizes a captured amount (`1,499`, `1.5` + `k`) to a plain number.
fn amount(caps: &Captures<'_>, digits: usize, k_group: Option<usize>) -> Option<String> {
    let raw = caps.get(digits)?.as_str().replace(',', "");
    let mut value: f64 = raw.parse().ok()?;
    if k_group.and_then(|g| caps.get(g)).is_some() {
        value *= 1000.0;
    }
    format_amount(value)
}

/// Formats an amount without trailing zeros. Amounts above [`MAX_PRICE`]
/// are dropped.
fn format_amount(value: f64) -> Option<String> {
    if !value.is_finite() || value > MAX_PRICE {
        return None;
    }
    if value.fract() == 0.0 {
        Some(format!("{}", value as i64))
    } else {
        let formatted = format!("{:.2}", value);
        Some(formatted.trim_end_matches('0').trim_end_matches('.').to_string())
    }
}

fn extract_prices(text: &str) -> (Option<String>, Option<String>) {
    let mut price = None;
    let mut original = None;

    if let Some(caps) = PAIR_REGEX.captures(text) {
        price = amount(&caps, 1, None);
        original = amount(&caps, 2, None);
    }

    if price.is_none() {
        let rupees: Vec<Captures<'_>> = RUPEE_REGEX.captures_iter(text).take(2).collect();
        if let Some(first) = rupees.first() {
            price = amount(first, 1, Some(2));
        }
        if let Some(second) = rupees.get(1) {
            original = amount(second, 1, Some(2));
        }
    }

    if price.is_none() {
        price = DEAL_REGEX.captures(text).and_then(|c| amount(&c, 1, Some(2)));
    }

    if let Some(reg) = REG_REGEX.captures(text).and_then(|c| amount(&c, 1, Some(2))) {
        if original.is_none() {
            original = Some(reg);
        } else if price.is_none() {
            price = Some(reg);
        }
    }

    if price.is_none() {
        price = PRICE_COLON_REGEX
            .captures(text)
            .and_then(|c| amount(&c, 1, Some(2)));
    }

    if original.is_none() {
        original = MRP_REGEX.captures(text).and_then(|c| amount(&c, 1, Some(2)));
    }

    (price, original)
}

fn extract_discount(text: &str, price: Option<&str>, original: Option<&str>) -> Option<i64> {
    if let Some(caps) = PERCENT_REGEX.captures(text) {
        if let Ok(percent) = caps[1].parse::<i64>() {
            if (1..=100).contains(&percent) {
                return Some(percent);
            }
        }
    }

    if let (Some(_), Some(original)) = (price, original) {
        if let Some(caps) = SAVE_REGEX.captures(text) {
            let saved: f64 = caps[1].replace(',', "").parse().unwrap_or(0.0);
            let original: f64 = original.parse().unwrap_or(0.0);
            if saved > 0.0 && original > 0.0 {
                let percent = ((saved / original) * 100.0).round() as i64;
                if (1..=100).contains(&percent) {
                    return Some(percent);
                }
            }
        }
    }

    match (price, original) {
        (Some(price), Some(original)) => discount_from_prices(price, original),
        _ => None,
    }
}

fn extract_description(text: &str, lines: &[&str], title: &str) -> Option<String> {
    let picked: Vec<String> = lines
        .iter()
        .filter(|line| !URL_REGEX.is_match(line))
        .map(|line| strip_decorations(line))
        .filter(|line| {
            let lower = line.to_lowercase();
            !line.is_empty()
                && !lower.contains("deal @")
                && !lower.contains("reg @")
                && !lower.contains("price:")
                && !lower.contains("mrp")
                && !PERCENT_REGEX.is_match(line)
                && line != title
        })
        .take(3)
        .collect();

    let description = truncate_chars(picked.join(" ").trim(), DESCRIPTION_LIMIT);
    if !description.is_empty() {
        return Some(description);
    }

    let without_urls = URL_REGEX.replace_all(text, "");
    let fallback = truncate_chars(
        &crate::text::collapse_whitespace(&strip_decorations(&without_urls)),
        DESCRIPTION_LIMIT,
    );
    (!fallback.is_empty()).then_some(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_deal() {
        let msg = "🔥 boAt Airdopes 141 Bluetooth Earbuds\n\
                   Deal @ ₹999 Reg @ ₹4,490\n\
                   https://amzn.to/3abcd";
        let parsed = parse_message(msg);
        assert_eq!(parsed.title, "boAt Airdopes 141 Bluetooth Earbuds");
        assert_eq!(parsed.price.as_deref(), Some("999"));
        assert_eq!(parsed.original_price.as_deref(), Some("4490"));
        assert_eq!(parsed.discount, Some(78));
    }

    #[test]
    fn test_parse_price_pair() {
        let parsed = parse_message("Noise ColorFit Pulse smartwatch\n₹1,299 ₹3,999\nhttps://fkrt.it/x");
        assert_eq!(parsed.price.as_deref(), Some("1299"));
        assert_eq!(parsed.original_price.as_deref(), Some("3999"));
    }

    #[test]
    fn test_parse_k_suffix() {
        let parsed = parse_message("Samsung Galaxy M14 5G phone\nDeal @ 12.5k\nMRP 18k\nhttps://amzn.to/x");
        assert_eq!(parsed.price.as_deref(), Some("12500"));
        assert_eq!(parsed.original_price.as_deref(), Some("18000"));
        assert_eq!(parsed.discount, Some(31));
    }

    #[test]
    fn test_explicit_discount_wins() {
        let parsed = parse_message("Lenovo IdeaPad Slim 3 laptop\n₹35,990 ₹60,000\n45% off\nhttps://amzn.to/x");
        assert_eq!(parsed.discount, Some(45));
    }

    #[test]
    fn test_price_colon() {
        let parsed = parse_message("Philips Trimmer BT1232 for men\nPrice: 899\nhttps://amzn.to/x");
        assert_eq!(parsed.price.as_deref(), Some("899"));
        assert_eq!(parsed.original_price, None);
        assert_eq!(parsed.discount, None);
    }

    #[test]
    fn test_url_only_amazon_keywords() {
        let parsed = parse_message("https://www.amazon.in/s?keywords=wireless+mouse");
        assert_eq!(parsed.title, "wireless mouse");
        assert!(parsed.description.unwrap().starts_with("Product available at:"));
    }

    #[test]
    fn test_url_only_amazon_asin() {
        let parsed = parse_message("https://www.amazon.in/dp/B09N3ZNHTY");
        assert_eq!(parsed.title, "Amazon Product B09N3ZNHTY");
        assert!(is_generic_title(&parsed.title));
    }

    #[test]
    fn test_url_only_other_platforms() {
        assert_eq!(parse_message("https://www.flipkart.com/p/itm123").title, "Flipkart Product");
        assert_eq!(parse_message("https://www.myntra.com/123/buy").title, "Myntra Product");
        assert_eq!(parse_message("https://example.com/x").title, FALLBACK_TITLE);
    }

    #[test]
    fn test_title_skips_promotional_lines() {
        let msg = "⚡ Limited time offer\nFlat 50% off\nPigeon Electric Kettle 1.5L\nhttps://amzn.to/x";
        assert_eq!(parse_message(msg).title, "Pigeon Electric Kettle 1.5L");
    }

    #[test]
    fn test_title_falls_back() {
        assert_eq!(parse_message("₹99\nhttps://amzn.to/x abc").title, FALLBACK_TITLE);
    }

    #[test]
    fn test_description_excludes_prices_and_urls() {
        let msg = "Prestige Induction Cooktop\nDeal @ ₹1,799\nTouch panel, 2000W\nhttps://amzn.to/x";
        let parsed = parse_message(msg);
        assert_eq!(parsed.description.as_deref(), Some("Touch panel, 2000W"));
    }

    #[test]
    fn test_save_amount_discount() {
        let msg = "JBL Go 3 Speaker\n₹2,499 ₹4,999\nSave ₹2,500\nhttps://amzn.to/x";
        assert_eq!(parse_message(msg).discount, Some(50));
    }

    #[test]
    fn test_caption_title() {
        assert_eq!(
            caption_title("🔥 Puma Running Shoes\n₹1,299").as_deref(),
            Some("Puma Running Shoes")
        );
        assert_eq!(caption_title("₹499 deal"), None);
        assert_eq!(caption_title("https://amzn.to/x"), None);
    }

    #[test]
    fn test_discount_from_prices() {
        assert_eq!(discount_from_prices("500", "1000"), Some(50));
        assert_eq!(discount_from_prices("1000", "500"), None);
        assert_eq!(discount_from_prices("abc", "500"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1500.0).as_deref(), Some("1500"));
        assert_eq!(format_amount(99.5).as_deref(), Some("99.5"));
        assert_eq!(format_amount(1e30), None);
    }

    #[test]
    fn test_oversized_price_is_dropped() {
        let parsed = parse_message(
            "Mystery Gadget Bundle for everyone\nDeal @ ₹99999999999999999999999\nhttps://amzn.to/x",
        );
        assert_eq!(parsed.price, None);
    }
}
