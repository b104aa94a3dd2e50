//! Site pages and the per-row `display_pages` set.
//!
//! Every content row carries a list of page slugs deciding where it is shown.
//! Historic rows stored that list in several shapes (JSON arrays, quoted JSON
//! strings, comma separated text, a bare slug), so parsing is lenient while
//! serialization always produces a canonical JSON array.

use serde::{Deserialize, Serialize};

pub const HOME: &str = "home";
pub const PRIME_PICKS: &str = "prime-picks";
pub const CUE_PICKS: &str = "cue-picks";
pub const VALUE_PICKS: &str = "value-picks";
pub const CLICK_PICKS: &str = "click-picks";
pub const GLOBAL_PICKS: &str = "global-picks";
pub const TRAVEL_PICKS: &str = "travel-picks";
pub const DEALS_HUB: &str = "deals-hub";
pub const LOOT_BOX: &str = "loot-box";
pub const TOP_PICKS: &str = "top-picks";
pub const FEATURED: &str = "featured";
pub const SERVICES: &str = "services";
pub const APPS: &str = "apps";
pub const APPS_AI_APPS: &str = "apps-ai-apps";

/// Page a row with no display pages falls back to.
pub const DEFAULT_PAGE: &str = PRIME_PICKS;

/// Normalizes a page slug: trimmed, lower-case, spaces and underscores as dashes.
pub fn normalize_slug(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Ordered, de-duplicated set of page slugs a row is displayed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DisplayPages(Vec<String>);

impl DisplayPages {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a set holding a single page.
    pub fn single(slug: &str) -> Self {
        let mut pages = Self::new();
        pages.push(slug);
        pages
    }

    /// Builds a set from slugs, normalizing and dropping duplicates.
    pub fn from_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pages = Self::new();
        for slug in slugs {
            pages.push(slug.as_ref());
        }
        pages
    }

    /// Parses a stored `display_pages` value in any of its historic shapes.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
            return Self::new();
        }

        if trimmed.starts_with('[') || trimmed.starts_with('"') {
            match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(serde_json::Value::Array(items)) => {
                    return Self::from_slugs(items.iter().filter_map(|v| v.as_str()));
                }
                Ok(serde_json::Value::String(inner)) if inner.trim() != trimmed => {
                    return Self::parse(&inner);
                }
                _ => {}
            }
        }

        let stripped = trimmed.trim_start_matches('[').trim_end_matches(']');
        Self::from_slugs(stripped.split(|c| c == ',' || c == '|'))
    }

    /// Adds a page unless it is empty or already present.
    pub fn push(&mut self, slug: &str) {
        let slug = normalize_slug(slug);
        if !slug.is_empty() && !self.0.contains(&slug) {
            self.0.push(slug);
        }
    }

    /// Adds every page from another set.
    pub fn extend(&mut self, other: &DisplayPages) {
        for slug in &other.0 {
            self.push(slug);
        }
    }

    /// Returns true if the row is shown on `page` (exact slug match).
    pub fn matches(&self, page: &str) -> bool {
        let page = normalize_slug(page);
        if self.0.is_empty() {
            return page == DEFAULT_PAGE;
        }
        self.0.iter().any(|p| *p == page)
    }

    /// Returns true if no page is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the pages as slices.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterates over the page slugs.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Serializes to the canonical JSON array stored in SQLite.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl From<Vec<String>> for DisplayPages {
    fn from(slugs: Vec<String>) -> Self {
        Self::from_slugs(slugs)
    }
}

impl From<DisplayPages> for Vec<String> {
    fn from(pages: DisplayPages) -> Self {
        pages.0
    }
}

/// How a page request selects rows.
///
/// A few pages are virtual: they are driven by a row flag instead of the
/// row's display pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFilter {
    /// Rows flagged `is_featured`.
    Featured,
    /// Rows flagged `is_service`.
    Services,
    /// Rows flagged `is_ai_app`.
    Apps,
    /// Rows whose display pages contain the slug.
    Slug(String),
}

impl PageFilter {
    /// Resolves a requested page name into a filter.
    pub fn for_page(page: &str) -> Self {
        let slug = normalize_slug(page);
        match slug.as_str() {
            TOP_PICKS => PageFilter::Featured,
            SERVICES => PageFilter::Services,
            APPS | APPS_AI_APPS => PageFilter::Apps,
            _ => PageFilter::Slug(slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let pages = DisplayPages::parse(r#"["prime-picks","home"]"#);
        assert_eq!(pages.as_slice(), &["prime-picks", "home"]);
    }

    #[test]
    fn test_parse_legacy_shapes() {
        assert_eq!(
            DisplayPages::parse("prime-picks, click-picks").as_slice(),
            &["prime-picks", "click-picks"]
        );
        assert_eq!(DisplayPages::parse("Loot Box").as_slice(), &["loot-box"]);
        assert_eq!(
            DisplayPages::parse(r#""[\"apps\"]""#).as_slice(),
            &["apps"]
        );
        assert_eq!(
            DisplayPages::parse("[prime-picks, home]").as_slice(),
            &["prime-picks", "home"]
        );
    }

    #[test]
    fn test_parse_empty_values() {
        assert!(DisplayPages::parse("").is_empty());
        assert!(DisplayPages::parse("  ").is_empty());
        assert!(DisplayPages::parse("[]").is_empty());
        assert!(DisplayPages::parse("null").is_empty());
    }

    #[test]
    fn test_dedupe_keeps_order() {
        let pages = DisplayPages::from_slugs(["home", "Prime-Picks", "home", "prime-picks"]);
        assert_eq!(pages.as_slice(), &["home", "prime-picks"]);
    }

    #[test]
    fn test_matches_is_exact() {
        let pages = DisplayPages::parse(r#"["apps-ai-apps"]"#);
        assert!(pages.matches("apps-ai-apps"));
        assert!(!pages.matches("apps"));
        assert!(pages.matches(" APPS-AI-APPS "));
    }

    #[test]
    fn test_empty_matches_default_page() {
        let pages = DisplayPages::new();
        assert!(pages.matches(DEFAULT_PAGE));
        assert!(!pages.matches(HOME));
    }

    #[test]
    fn test_to_json() {
        let pages = DisplayPages::from_slugs(["travel-picks", "flights"]);
        assert_eq!(pages.to_json(), r#"["travel-picks","flights"]"#);
        assert_eq!(DisplayPages::new().to_json(), "[]");
    }

    #[test]
    fn test_serde_normalizes() {
        let pages: DisplayPages = serde_json::from_str(r#"["Home", "home", "Deals Hub"]"#).unwrap();
        assert_eq!(pages.as_slice(), &["home", "deals-hub"]);
        assert_eq!(serde_json::to_string(&pages).unwrap(), r#"["home","deals-hub"]"#);
    }

    #[test]
    fn test_page_filter() {
        assert_eq!(PageFilter::for_page("top-picks"), PageFilter::Featured);
        assert_eq!(PageFilter::for_page("services"), PageFilter::Services);
        assert_eq!(PageFilter::for_page("apps"), PageFilter::Apps);
        assert_eq!(PageFilter::for_page("apps-ai-apps"), PageFilter::Apps);
        assert_eq!(
            PageFilter::for_page("Click Picks"),
            PageFilter::Slug("click-picks".to_string())
        );
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  Prime_Picks "), "prime-picks");
        assert_eq!(normalize_slug("\"home\""), "home");
        assert_eq!(normalize_slug(""), "");
    }
}
