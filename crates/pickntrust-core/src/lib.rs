//! PickNTrust Core - shared business logic for the API, bot and CLI.
//!
//! - **config**: State directory and file paths
//! - **settings**: Environment settings and the monitored channel registry
//! - **message_parser**: Title/price/discount extraction from deal posts
//! - **categorize**: Flags, category and display pages for ingested rows
//! - **travel**: Travel subcategory detection
//! - **categories**: Category name standardization
//! - **text**: Word-boundary matching and text cleanup helpers

pub mod categories;
pub mod categorize;
pub mod config;
pub mod message_parser;
pub mod settings;
pub mod text;
pub mod travel;

pub use categories::{slugify, standardize_category, CANONICAL_CATEGORIES};
pub use categorize::{categorize, should_auto_categorize, Categorization};
pub use config::{
    backups_dir, channels_file, config_dir, database_path, db_dir, ensure_all_dirs, env_file,
    state_dir,
};
pub use message_parser::{
    caption_title, discount_from_prices, is_generic_title, parse_message, ParsedMessage,
    FALLBACK_TITLE,
};
pub use settings::{ChannelRegistry, ConfigError, Environment, Settings};
pub use travel::{detect_travel, extract_route, is_travel_related, DetectedFrom, TravelDetection};
