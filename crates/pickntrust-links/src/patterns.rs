//! Pattern matching utilities for deal post text.

use regex::Regex;
use std::sync::OnceLock;

/// A compiled, named pattern.
#[derive(Debug)]
pub struct Pattern {
    /// Human-readable name for this pattern.
    pub name: &'static str,
    regex: Regex,
}

impl Pattern {
    /// Creates a new pattern.
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Checks if the pattern matches the given text.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Finds all matches in the text.
    pub fn find_all<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.regex.find_iter(text).map(|m| m.as_str()).collect()
    }
}

/// Link shortener domains.
pub const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "amzn.to",
    "fkrt.it",
    "bitli.in",
    "goo.gl",
    "t.co",
    "short.link",
    "cutt.ly",
    "rb.gy",
    "is.gd",
    "v.gd",
    "ow.ly",
    "buff.ly",
    "a.co",
];

/// Characters stripped from the end of an extracted URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', '!', '?', ')', ']'];

fn url_pattern() -> &'static Pattern {
    static PATTERN: OnceLock<Pattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Pattern::new(
            "url",
            r#"(?i)\b(?:https?://[^\s<>"]+|(?:www\.)?(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}/[^\s<>"]*)"#,
        )
    })
}

/// Returns patterns marking a URL that already carries someone's affiliate id.
pub fn affiliate_patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Pattern::new("tag", r"[?&]tag="),
            Pattern::new("ref", r"[?&]ref="),
            Pattern::new("affiliate", r"(?i)affiliate"),
            Pattern::new("partner", r"(?i)partner"),
            Pattern::new("cid", r"[?&]cid="),
            Pattern::new("linkkit", r"source=linkkit"),
            Pattern::new("wrapper", r"(?i)linksredirect\.com|inrdeals\.com|earnkaro\.com"),
        ]
    })
}

/// Extracts URLs from free text.
///
/// Accepts explicit `http(s)://` URLs and bare domains followed by a path.
/// Results are `https://` prefixed when the scheme is missing, stripped of
/// trailing punctuation and de-duplicated in order of appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for raw in url_pattern().find_all(text) {
        let trimmed = raw.trim_end_matches(TRAILING_PUNCTUATION);
        if trimmed.is_empty() {
            continue;
        }
        let url = if trimmed.to_lowercase().starts_with("http") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Returns the lower-cased host of `url`, without a leading `www.`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Returns true if `host` is `domain` or a subdomain of it.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Returns true if the URL points at a known link shortener.
pub fn is_shortened(url: &str) -> bool {
    host_of(url).is_some_and(|host| SHORTENER_DOMAINS.iter().any(|d| host == *d))
}
