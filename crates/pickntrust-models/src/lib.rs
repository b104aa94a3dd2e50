//! Core data models for PickNTrust.
//!
//! This crate provides the fundamental data types used throughout the
//! PickNTrust system: unified content rows, display page sets, monitored
//! channel configuration and the raw channel posts the ingestion bot stores.

pub mod builders;
pub mod channel;
pub mod content;
pub mod pages;

// Re-export main types
pub use builders::ContentBuilder;
pub use channel::{AffiliateNetwork, ChannelConfig, ChannelPost, NewChannelPost};
pub use content::{
    ContentId, ContentItem, ContentPatch, ContentType, NewContent, ProcessingStatus, SourceType,
    DEFAULT_CURRENCY, MAX_PRICE, PLACEHOLDER_IMAGE, TIMER_HOURS,
};
pub use pages::{normalize_slug, DisplayPages, PageFilter};
