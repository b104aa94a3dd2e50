//! Category name standardization.
//!
//! Folds typos and synonyms onto the canonical category names used by the
//! site's navigation.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::sync::LazyLock;

use crate::text::{collapse_whitespace, title_case};

/// Canonical top-level categories.
pub const CANONICAL_CATEGORIES: &[&str] = &[
    "Fashion & Accessories",
    "Home & Living",
    "Electronics & Gadgets",
    "Health & Beauty",
    "Sports & Fitness",
    "Baby & Kids",
    "Automotive",
    "Books & Education",
    "Pet Supplies",
    "Office & Productivity",
    "Travel",
    "Services",
    "Apps & AI Apps",
];

/// Known synonyms, matched case-insensitively against the whole name.
const SYNONYMS: &[(&[&str], &str)] = &[
    (&["jewellery", "jewelery", "jewelry", "jewelries", "watch", "watches"], "Jewelry & Watches"),
    (&["home", "home & living", "home and living"], "Home & Living"),
    (&["home & kitchen", "home and kitchen", "kitchen and dining", "kitchen & dining"], "Kitchen & Dining"),
    (&["home & garden", "home and garden"], "Garden & Outdoor"),
    (&["home decor", "decor"], "Home Decor"),
    (&["electronics", "gadgets"], "Electronics & Gadgets"),
    (&["fashion", "clothing", "fashion & clothing"], "Fashion & Accessories"),
    (&["ai apps", "apps", "ai & apps"], "Apps & AI Apps"),
];

/// Shortest name considered for fuzzy matching.
const MIN_FUZZY_LEN: usize = 4;

/// Per-character score a fuzzy match must average to be accepted.
const MIN_SCORE_PER_CHAR: i64 = 20;

static MATCHER: LazyLock<SkimMatcherV2> = LazyLock::new(SkimMatcherV2::default);

fn fuzzy_canonical(name: &str) -> Option<&'static str> {
    let pattern_len = name.chars().count();
    if pattern_len < MIN_FUZZY_LEN {
        return None;
    }
    let threshold = MIN_SCORE_PER_CHAR * pattern_len as i64;
    CANONICAL_CATEGORIES
        .iter()
        .filter_map(|choice| MATCHER.fuzzy_match(choice, name).map(|score| (*choice, score)))
        .filter(|(_, score)| *score >= threshold)
        .max_by_key(|(_, score)| *score)
        .map(|(choice, _)| choice)
}

/// Maps a raw category name onto its standard spelling.
///
/// Unknown names are returned with collapsed whitespace, title-cased when
/// they were entirely lower-case.
pub fn standardize_category(raw: &str) -> String {
    let name = collapse_whitespace(raw);
    if name.is_empty() {
        return name;
    }
    let lower = name.to_lowercase();

    if let Some((_, target)) = SYNONYMS.iter().find(|(names, _)| names.contains(&lower.as_str())) {
        return target.to_string();
    }
    if let Some(canonical) = CANONICAL_CATEGORIES
        .iter()
        .find(|c| c.to_lowercase() == lower)
    {
        return canonical.to_string();
    }
    if let Some(canonical) = fuzzy_canonical(&lower) {
        return canonical.to_string();
    }

    if name == lower {
        title_case(&name)
    } else {
        name
    }
}

/// URL slug for a category name.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    slug.chars().take(64).collect::<String>().trim_end_matches('-').to_string()
}
