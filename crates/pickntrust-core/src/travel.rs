//! Travel subcategory detection for the travel deals channel.
//!
//! Detection order: known partner domain, then URL path hints, then keyword
//! scores over the message text.

use regex::Regex;
use std::sync::LazyLock;

use crate::text::contains_term;

/// Category assigned to every travel row.
pub const TRAVEL_CATEGORY: &str = "Travel";

pub const FLIGHTS: &str = "Flights";
pub const HOTELS: &str = "Hotels";
pub const BUS: &str = "Bus";
pub const TRAIN: &str = "Train";
pub const PACKAGES: &str = "Packages";
pub const CAR_RENTAL: &str = "Car Rental";
pub const TOURS: &str = "Tours";
pub const ACTIVITIES: &str = "Activities";

/// Partner domains and the subcategory they sell.
const PARTNERS: &[(&str, &str, &str)] = &[
    ("makemytrip.com", FLIGHTS, "MakeMyTrip"),
    ("goibibo.com", FLIGHTS, "Goibibo"),
    ("cleartrip.com", FLIGHTS, "Cleartrip"),
    ("yatra.com", FLIGHTS, "Yatra"),
    ("expedia.com", FLIGHTS, "Expedia"),
    ("booking.com", HOTELS, "Booking.com"),
    ("agoda.com", HOTELS, "Agoda"),
    ("hotels.com", HOTELS, "Hotels.com"),
    ("oyo.com", HOTELS, "OYO"),
    ("oyorooms.com", HOTELS, "OYO"),
    ("redbus.in", BUS, "RedBus"),
    ("abhibus.com", BUS, "AbhiBus"),
    ("irctc.co.in", TRAIN, "IRCTC"),
    ("confirmtkt.com", TRAIN, "ConfirmTkt"),
    ("zoomcar.com", CAR_RENTAL, "Zoomcar"),
    ("revv.co.in", CAR_RENTAL, "Revv"),
    ("thrillophilia.com", TOURS, "Thrillophilia"),
    ("viator.com", ACTIVITIES, "Viator"),
];

const PATH_HINTS: &[(&str, &str)] = &[
    ("/flights/", FLIGHTS),
    ("/flight/", FLIGHTS),
    ("/hotels/", HOTELS),
    ("/hotel/", HOTELS),
    ("/bus/", BUS),
    ("/buses/", BUS),
    ("/train/", TRAIN),
    ("/trains/", TRAIN),
    ("/packages/", PACKAGES),
    ("/package/", PACKAGES),
    ("/cars/", CAR_RENTAL),
    ("/car-rental/", CAR_RENTAL),
    ("/activities/", ACTIVITIES),
    ("/tours/", TOURS),
];

/// Keyword groups per subcategory with their weights.
struct KeywordProfile {
    subcategory: &'static str,
    groups: &'static [(&'static [&'static str], u32)],
}

const PROFILES: &[KeywordProfile] = &[
    KeywordProfile {
        subcategory: FLIGHTS,
        groups: &[
            (&["flight", "flights", "airline", "airways", "fly", "flying"], 10),
            (&["departure", "arrival", "boarding", "terminal", "runway"], 5),
            (&["non-stop", "direct", "connecting", "layover", "domestic", "international"], 2),
        ],
    },
    KeywordProfile {
        subcategory: HOTELS,
        groups: &[
            (&["hotel", "hotels", "resort", "stay", "accommodation", "room", "suite"], 10),
            (&["check-in", "check-out", "reservation", "night", "nights"], 5),
            (&["luxury", "budget", "deluxe", "wifi", "pool", "spa", "breakfast"], 2),
        ],
    },
    KeywordProfile {
        subcategory: BUS,
        groups: &[
            (&["bus", "buses", "coach", "volvo", "sleeper", "seater"], 10),
            (&["redbus", "abhibus", "travels"], 5),
            (&["non-ac", "semi-sleeper", "multi-axle"], 2),
        ],
    },
    KeywordProfile {
        subcategory: TRAIN,
        groups: &[
            (&["train", "trains", "railway", "irctc", "rail"], 10),
            (&["station", "berth"], 5),
            (&["tatkal", "1a", "2a", "3a", "rajdhani", "shatabdi", "duronto", "vande bharat"], 2),
        ],
    },
    KeywordProfile {
        subcategory: PACKAGES,
        groups: &[
            (&["package", "packages", "tour", "trip", "holiday", "vacation"], 10),
            (&["itinerary", "sightseeing", "guided", "family"], 5),
            (&["all-inclusive", "customized", "honeymoon", "adventure", "pilgrimage"], 2),
        ],
    },
    KeywordProfile {
        subcategory: CAR_RENTAL,
        groups: &[
            (&["car", "cab", "taxi", "rental", "self-drive"], 10),
            (&["driver", "chauffeur", "outstation"], 5),
            (&["sedan", "suv", "hatchback"], 2),
        ],
    },
];

/// Minimum keyword score for a content based match.
const MIN_KEYWORD_SCORE: u32 = 5;

static ROUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][A-Za-z]+(?:\s[A-Z][a-z]+)?)(?:\s*(?:→|->)\s*|\s+(?:to|To|TO)\s+)([A-Z][A-Za-z]+(?:\s[A-Z][a-z]+)?)",
    )
        .expect("Invalid route regex")
});

/// How a subcategory was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFrom {
    Partner,
    UrlPath,
    Keywords,
    Fallback,
}

/// Travel detection result.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelDetection {
    pub subcategory: String,
    /// Confidence 0.0-1.0.
    pub confidence: f32,
    pub detected_from: DetectedFrom,
    /// Partner brand when detected from the domain.
    pub partner: Option<String>,
    /// "Delhi → Goa" style route for transport deals.
    pub route: Option<String>,
}

impl TravelDetection {
    /// Returns the page slug for the subcategory, if it has its own page.
    pub fn subcategory_slug(&self) -> Option<String> {
        if self.detected_from == DetectedFrom::Fallback {
            return None;
        }
        Some(pickntrust_models::normalize_slug(&self.subcategory))
    }
}

fn detect_from_url(url: &str) -> Option<TravelDetection> {
    let lower = url.to_lowercase();
    let host = url::Url::parse(&lower)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    for (domain, subcategory, partner) in PARTNERS {
        if host == *domain || host.ends_with(&format!(".{}", domain)) {
            return Some(TravelDetection {
                subcategory: subcategory.to_string(),
                confidence: 0.95,
                detected_from: DetectedFrom::Partner,
                partner: Some(partner.to_string()),
                route: None,
            });
        }
    }

    PATH_HINTS
        .iter()
        .find(|(hint, _)| lower.contains(hint))
        .map(|(_, subcategory)| TravelDetection {
            subcategory: subcategory.to_string(),
            confidence: 0.85,
            detected_from: DetectedFrom::UrlPath,
            partner: None,
            route: None,
        })
}

fn detect_from_text(text: &str) -> Option<TravelDetection> {
    let lower = text.to_lowercase();
    let mut best: Option<(&'static str, u32)> = None;

    for profile in PROFILES {
        let score: u32 = profile
            .groups
            .iter()
            .map(|(terms, weight)| {
                terms
                    .iter()
                    .filter(|t| contains_term(&lower, t))
                    .map(|_| weight + 1)
                    .sum::<u32>()
            })
            .sum();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((profile.subcategory, score));
        }
    }

    let (subcategory, score) = best?;
    if score < MIN_KEYWORD_SCORE {
        return None;
    }
    Some(TravelDetection {
        subcategory: subcategory.to_string(),
        confidence: (score as f32 / 20.0).min(0.9),
        detected_from: DetectedFrom::Keywords,
        partner: None,
        route: None,
    })
}

/// Extracts a "From → To" route from the text.
pub fn extract_route(text: &str) -> Option<String> {
    ROUTE_REGEX
        .captures(text)
        .map(|caps| format!("{} → {}", caps[1].trim(), caps[2].trim()))
}

/// Detects the travel subcategory of a deal.
pub fn detect_travel(text: &str, url: Option<&str>) -> TravelDetection {
    let mut detection = url
        .and_then(detect_from_url)
        .or_else(|| detect_from_text(text))
        .unwrap_or_else(|| TravelDetection {
            subcategory: TRAVEL_CATEGORY.to_string(),
            confidence: 0.1,
            detected_from: DetectedFrom::Fallback,
            partner: None,
            route: None,
        });

    if matches!(detection.subcategory.as_str(), FLIGHTS | BUS | TRAIN) {
        detection.route = extract_route(text);
    }
    detection
}

/// Returns true if the text or URL looks travel related.
pub fn is_travel_related(text: &str, url: Option<&str>) -> bool {
    detect_travel(text, url).confidence > 0.3
}
