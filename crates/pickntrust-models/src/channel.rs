//! Monitored Telegram channels and the raw posts received from them.

use serde::{Deserialize, Serialize};

use crate::pages::TRAVEL_PICKS;

/// Affiliate network a channel's links are converted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffiliateNetwork {
    Amazon,
    Cuelinks,
    Inrdeals,
    Earnkaro,
    Deodap,
    /// The channel mixes networks; the first entry of `networks` is used.
    Multiple,
}

impl AffiliateNetwork {
    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AffiliateNetwork::Amazon => "amazon",
            AffiliateNetwork::Cuelinks => "cuelinks",
            AffiliateNetwork::Inrdeals => "inrdeals",
            AffiliateNetwork::Earnkaro => "earnkaro",
            AffiliateNetwork::Deodap => "deodap",
            AffiliateNetwork::Multiple => "multiple",
        }
    }

    /// Parses a network name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "amazon" => Some(AffiliateNetwork::Amazon),
            "cuelinks" => Some(AffiliateNetwork::Cuelinks),
            "inrdeals" => Some(AffiliateNetwork::Inrdeals),
            "earnkaro" => Some(AffiliateNetwork::Earnkaro),
            "deodap" => Some(AffiliateNetwork::Deodap),
            "multiple" => Some(AffiliateNetwork::Multiple),
            _ => None,
        }
    }
}

impl std::fmt::Display for AffiliateNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Configuration of one monitored channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Telegram chat id (negative for channels).
    pub channel_id: i64,
    /// Human readable page name.
    pub page_name: String,
    /// Site page the channel feeds.
    pub page_slug: String,
    /// Affiliate network for link conversion.
    pub network: AffiliateNetwork,
    /// Networks to pick from when `network` is `multiple`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<AffiliateNetwork>,
    /// Network specific tag or id (`tag=`, `cid`, `ref=`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_tag: Option<String>,
    /// Whether links posted in this channel get converted.
    #[serde(default = "default_true")]
    pub convert_links: bool,
}

impl ChannelConfig {
    /// Creates a channel config that converts links for `network`.
    pub fn new(
        channel_id: i64,
        page_name: impl Into<String>,
        page_slug: impl Into<String>,
        network: AffiliateNetwork,
    ) -> Self {
        Self {
            channel_id,
            page_name: page_name.into(),
            page_slug: page_slug.into(),
            network,
            networks: Vec::new(),
            affiliate_tag: None,
            convert_links: true,
        }
    }

    /// Sets the affiliate tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.affiliate_tag = Some(tag.into());
        self
    }

    /// Sets the candidate networks for a `multiple` channel.
    pub fn with_networks(mut self, networks: Vec<AffiliateNetwork>) -> Self {
        self.networks = networks;
        self
    }

    /// Keeps posted links untouched.
    pub fn without_conversion(mut self) -> Self {
        self.convert_links = false;
        self
    }

    /// Returns the network links are actually converted for.
    ///
    /// `multiple` resolves to the first configured network, or cuelinks.
    pub fn effective_network(&self) -> AffiliateNetwork {
        match self.network {
            AffiliateNetwork::Multiple => self
                .networks
                .iter()
                .copied()
                .find(|n| *n != AffiliateNetwork::Multiple)
                .unwrap_or(AffiliateNetwork::Cuelinks),
            other => other,
        }
    }

    /// Returns true for the travel deals channel.
    pub fn is_travel(&self) -> bool {
        self.page_slug == TRAVEL_PICKS
    }
}

/// A stored `channel_posts` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPost {
    pub id: i64,
    pub channel_id: i64,
    pub channel_name: String,
    pub website_page: String,
    pub message_id: i64,
    pub original_text: String,
    pub processed_text: Option<String>,
    pub extracted_urls: Vec<String>,
    pub image_url: Option<String>,
    pub is_processed: bool,
    pub is_posted: bool,
    pub processing_error: Option<String>,
    pub telegram_timestamp: Option<i64>,
    pub processed_at: Option<i64>,
    pub posted_at: Option<i64>,
    pub created_at: i64,
}

/// A channel post to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChannelPost {
    pub channel_id: i64,
    pub channel_name: String,
    pub website_page: String,
    pub message_id: i64,
    pub original_text: String,
    pub extracted_urls: Vec<String>,
    pub image_url: Option<String>,
    pub telegram_timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_network() {
        let amazon = ChannelConfig::new(-1, "Prime Picks", "prime-picks", AffiliateNetwork::Amazon);
        assert_eq!(amazon.effective_network(), AffiliateNetwork::Amazon);

        let multi = ChannelConfig::new(-2, "Click Picks", "click-picks", AffiliateNetwork::Multiple)
            .with_networks(vec![AffiliateNetwork::Inrdeals, AffiliateNetwork::Earnkaro]);
        assert_eq!(multi.effective_network(), AffiliateNetwork::Inrdeals);

        let bare = ChannelConfig::new(-3, "Global Picks", "global-picks", AffiliateNetwork::Multiple);
        assert_eq!(bare.effective_network(), AffiliateNetwork::Cuelinks);
    }

    #[test]
    fn test_channel_config_serde_defaults() {
        let json = r#"{"channel_id": -100, "page_name": "Loot Box", "page_slug": "loot-box", "network": "deodap"}"#;
        let config: ChannelConfig = serde_json::from_str(json).unwrap();
        assert!(config.convert_links);
        assert!(config.networks.is_empty());
        assert_eq!(config.network, AffiliateNetwork::Deodap);
    }

    #[test]
    fn test_is_travel() {
        let travel = ChannelConfig::new(-4, "Travel Picks", "travel-picks", AffiliateNetwork::Multiple);
        assert!(travel.is_travel());
    }

    #[test]
    fn test_network_parse() {
        assert_eq!(AffiliateNetwork::parse("EarnKaro"), Some(AffiliateNetwork::Earnkaro));
        assert_eq!(AffiliateNetwork::parse("flipkart"), None);
    }
}
