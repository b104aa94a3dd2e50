//! Smart categorization for automatically ingested content.
//!
//! Decides the featured/service/app flags, a category and the pages a row
//! is displayed on, from the channel it arrived on and keywords in its text.

use pickntrust_models::pages::{
    APPS, APPS_AI_APPS, CLICK_PICKS, CUE_PICKS, DEALS_HUB, FEATURED, GLOBAL_PICKS, HOME,
    LOOT_BOX, PRIME_PICKS, SERVICES, TOP_PICKS, TRAVEL_PICKS, VALUE_PICKS,
};
use pickntrust_models::{normalize_slug, DisplayPages};

use crate::text::{contains_term, count_terms};

const FEATURED_KEYWORDS: &[&str] = &[
    "premium", "exclusive", "limited", "special offer", "bestseller", "top rated",
    "editor choice", "recommended", "award winning", "featured", "trending", "popular",
    "hot deal", "must have", "top pick", "curated", "handpicked",
];

const SERVICE_KEYWORDS: &[&str] = &[
    "service", "subscription", "plan", "membership", "account", "access", "streaming", "cloud",
    "hosting", "vpn", "insurance", "banking", "credit card", "loan", "investment", "trading",
    "consultation", "support", "maintenance", "warranty", "protection", "security",
];

const AI_APP_KEYWORDS: &[&str] = &[
    "ai", "artificial intelligence", "machine learning", "ml", "neural", "smart", "intelligent",
    "automated", "bot", "assistant", "chatbot", "app", "application", "software", "tool",
    "platform", "saas", "mobile app", "web app", "desktop app", "chrome extension", "plugin",
    "addon", "widget", "api", "sdk",
];

/// A category candidate with the keywords pointing at it.
struct CategoryRule {
    category: &'static str,
    keywords: &'static [&'static str],
    priority: u32,
}

const SERVICE_CATEGORIES: &[CategoryRule] = &[
    CategoryRule {
        category: "Financial Services",
        keywords: &["credit card", "banking", "loan", "finance", "investment", "trading", "cryptocurrency"],
        priority: 10,
    },
    CategoryRule {
        category: "Entertainment Services",
        keywords: &["streaming", "netflix", "spotify", "music", "video", "entertainment", "subscription"],
        priority: 9,
    },
    CategoryRule {
        category: "Cloud Services",
        keywords: &["cloud", "storage", "hosting", "server", "database", "backup", "sync"],
        priority: 9,
    },
    CategoryRule {
        category: "Security Services",
        keywords: &["vpn", "security", "antivirus", "protection", "privacy", "cybersecurity"],
        priority: 9,
    },
    CategoryRule {
        category: "Insurance Services",
        keywords: &["insurance", "health", "life", "auto", "home", "travel", "coverage"],
        priority: 8,
    },
    CategoryRule {
        category: "Marketing Services",
        keywords: &["marketing", "seo", "advertising", "social media", "email marketing", "analytics"],
        priority: 8,
    },
    CategoryRule {
        category: "Education Services",
        keywords: &["education", "course", "training", "certification", "learning", "tutorial"],
        priority: 7,
    },
];

const AI_APP_CATEGORIES: &[CategoryRule] = &[
    CategoryRule {
        category: "AI Writing Tools",
        keywords: &["ai writing", "content generation", "copywriting", "text generator", "gpt"],
        priority: 15,
    },
    CategoryRule {
        category: "AI Image Tools",
        keywords: &["ai image", "image generation", "ai art", "photo editing", "ai photo"],
        priority: 14,
    },
    CategoryRule {
        category: "AI Assistants",
        keywords: &["chatbot", "ai assistant", "virtual assistant", "conversational ai"],
        priority: 14,
    },
    CategoryRule {
        category: "Productivity Apps",
        keywords: &["productivity", "task management", "project management", "organization"],
        priority: 12,
    },
    CategoryRule {
        category: "Design Apps",
        keywords: &["design", "graphics", "ui", "ux", "creative", "figma", "sketch"],
        priority: 11,
    },
    CategoryRule {
        category: "Developer Tools",
        keywords: &["developer", "coding", "programming", "api", "sdk", "development"],
        priority: 11,
    },
    CategoryRule {
        category: "Business Apps",
        keywords: &["business", "crm", "sales", "analytics", "dashboard", "reporting"],
        priority: 10,
    },
    CategoryRule {
        category: "Mobile Apps",
        keywords: &["mobile app", "ios", "android", "smartphone", "tablet"],
        priority: 9,
    },
];

/// Sources whose rows are categorized automatically.
const AUTO_SOURCES: &[&str] = &["telegram", "rss", "bot", "automation", "feed"];

/// Result of categorizing a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorization {
    pub is_featured: bool,
    pub is_service: bool,
    pub is_ai_app: bool,
    pub category: String,
    pub display_pages: DisplayPages,
    /// Confidence 0-100.
    pub confidence: u32,
}

/// Default flags implied by a channel's page.
fn channel_defaults(page_slug: &str) -> Option<(bool, bool, bool)> {
    match page_slug {
        PRIME_PICKS | CUE_PICKS | VALUE_PICKS | CLICK_PICKS | GLOBAL_PICKS => {
            Some((true, false, false))
        }
        DEALS_HUB | TRAVEL_PICKS => Some((false, true, false)),
        LOOT_BOX => Some((false, false, false)),
        _ => None,
    }
}

fn best_category(text: &str, rules: &[CategoryRule]) -> Option<&'static str> {
    let mut best: Option<(&'static str, u32)> = None;
    for rule in rules {
        let score = count_terms(text, rule.keywords) as u32 * rule.priority;
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((rule.category, score));
        }
    }
    best.map(|(category, _)| category)
}

/// Categorizes a row from its text, source channel page and platform.
///
/// The channel page itself always leads the returned display pages.
pub fn categorize(title: &str, description: &str, page_slug: &str, platform: &str) -> Categorization {
    let text = format!("{} {}", title, description).to_lowercase();
    let page_slug = normalize_slug(page_slug);

    let mut confidence = 0u32;
    let (mut is_featured, mut is_service, mut is_ai_app) = (false, false, false);

    if let Some((featured, service, ai_app)) = channel_defaults(&page_slug) {
        is_featured = featured;
        is_service = service;
        is_ai_app = ai_app;
        confidence += 30;
    }

    let featured_hits = count_terms(&text, FEATURED_KEYWORDS) as u32;
    if featured_hits > 0 {
        is_featured = true;
        confidence += featured_hits * 5;
    }

    let service_hits = count_terms(&text, SERVICE_KEYWORDS) as u32;
    if service_hits >= 2 {
        is_service = true;
        confidence += service_hits * 8;
    }

    let ai_hits = count_terms(&text, AI_APP_KEYWORDS) as u32;
    if ai_hits > 0 {
        is_ai_app = true;
        confidence += ai_hits * 10;
    }

    let platform = platform.to_lowercase();
    if contains_term(&platform, "app") || platform.contains("mobile") {
        is_ai_app = true;
        confidence += 15;
    }

    let category = if is_ai_app {
        best_category(&text, AI_APP_CATEGORIES).unwrap_or("AI & Apps")
    } else if is_service {
        best_category(&text, SERVICE_CATEGORIES).unwrap_or("Services")
    } else if is_featured {
        "Featured Products"
    } else {
        "General"
    };

    let mut display_pages = DisplayPages::new();
    display_pages.push(&page_slug);
    display_pages.push(HOME);
    if is_featured {
        display_pages.push(TOP_PICKS);
        display_pages.push(FEATURED);
    }
    if is_service {
        display_pages.push(SERVICES);
    }
    if is_ai_app {
        display_pages.push(APPS_AI_APPS);
        display_pages.push(APPS);
    }

    Categorization {
        is_featured,
        is_service,
        is_ai_app,
        category: category.to_string(),
        display_pages,
        confidence: confidence.min(100),
    }
}

/// Returns true if rows from `source_type` are categorized automatically.
/// Manually created rows keep what the admin chose.
pub fn should_auto_categorize(source_type: &str) -> bool {
    AUTO_SOURCES.contains(&source_type.trim().to_lowercase().as_str())
}
