//! Runtime settings and the monitored channel registry.
//!
//! Settings are read from the environment (after `.env.local` has been
//! loaded by the binary). Channel configuration lives in `channels.json`;
//! when that file is absent the production channel set is used.

use std::path::{Path, PathBuf};

use pickntrust_models::{AffiliateNetwork, ChannelConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::config;

/// Errors raised while loading settings or channel configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write a config file.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Channel file is not valid JSON.
    #[error("invalid channel config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The same chat id is configured twice.
    #[error("duplicate channel id: {0}")]
    DuplicateChannel(i64),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Settings shared by the API server, the bot and the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Token of the master ingestion bot (`MASTER_BOT_TOKEN`).
    pub bot_token: Option<String>,
    /// Chat receiving admin alerts (`BOT_ALERT_CHAT_ID`, then `MASTER_ADMIN_CHAT_ID`).
    pub alert_chat_id: Option<i64>,
    /// Public base URL used to register the webhook (`PUBLIC_BASE_URL`).
    pub public_base_url: Option<String>,
    /// Password guarding admin routes (`ADMIN_PASSWORD`).
    pub admin_password: Option<String>,
    /// Deployment environment (`PICKNTRUST_ENV`).
    pub environment: Environment,
    /// API bind host (`API_HOST`).
    pub api_host: String,
    /// API bind port (`API_PORT`).
    pub api_port: u16,
    /// Secret token Telegram sends with webhook requests (`WEBHOOK_SECRET`).
    pub webhook_secret: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: config::database_path(),
            bot_token: None,
            alert_chat_id: None,
            public_base_url: None,
            admin_password: None,
            environment: Environment::Development,
            api_host: "127.0.0.1".to_string(),
            api_port: 5000,
            webhook_secret: None,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Settings::default();

        Self {
            database_path: get(config::DATABASE_PATH_ENV)
                .map(|p| PathBuf::from(shellexpand::tilde(&p).into_owned()))
                .unwrap_or(defaults.database_path),
            bot_token: get("MASTER_BOT_TOKEN"),
            alert_chat_id: get("BOT_ALERT_CHAT_ID")
                .or_else(|| get("MASTER_ADMIN_CHAT_ID"))
                .and_then(|id| id.parse().ok()),
            public_base_url: get("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            admin_password: get("ADMIN_PASSWORD"),
            environment: get("PICKNTRUST_ENV")
                .map(|e| Environment::parse(&e))
                .unwrap_or_default(),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: get("API_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.api_port),
            webhook_secret: get("WEBHOOK_SECRET"),
        }
    }

    /// Returns true when running in production.
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// The set of monitored channels, keyed by chat id.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRegistry {
    channels: Vec<ChannelConfig>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ChannelRegistry {
    /// Creates a registry from explicit configs.
    pub fn new(channels: Vec<ChannelConfig>) -> Result<Self, ConfigError> {
        for (i, channel) in channels.iter().enumerate() {
            if channels[..i].iter().any(|c| c.channel_id == channel.channel_id) {
                return Err(ConfigError::DuplicateChannel(channel.channel_id));
            }
        }
        Ok(Self { channels })
    }

    /// The production channel set.
    pub fn defaults() -> Self {
        let mixed = vec![
            AffiliateNetwork::Cuelinks,
            AffiliateNetwork::Inrdeals,
            AffiliateNetwork::Earnkaro,
        ];

        Self {
            channels: vec![
                ChannelConfig::new(-1002955338551, "Prime Picks", "prime-picks", AffiliateNetwork::Amazon)
                    .with_tag("pickntrust03-21"),
                ChannelConfig::new(-1002982344997, "Cue Picks", "cue-picks", AffiliateNetwork::Cuelinks)
                    .with_tag("243942"),
                ChannelConfig::new(-1003017626269, "Value Picks", "value-picks", AffiliateNetwork::Earnkaro),
                ChannelConfig::new(-1002981205504, "Click Picks", "click-picks", AffiliateNetwork::Multiple)
                    .with_networks(mixed.clone()),
                ChannelConfig::new(-1002902496654, "Global Picks", "global-picks", AffiliateNetwork::Multiple)
                    .with_networks(mixed.clone()),
                ChannelConfig::new(-1003047967930, "Travel Picks", "travel-picks", AffiliateNetwork::Multiple)
                    .with_networks(mixed),
                ChannelConfig::new(-1003029983162, "Deals Hub", "deals-hub", AffiliateNetwork::Inrdeals)
                    .with_tag("id=sha678089037"),
                ChannelConfig::new(-1002991047787, "Loot Box", "loot-box", AffiliateNetwork::Deodap)
                    .with_tag("ref=sicvppak")
                    .without_conversion(),
            ],
        }
    }

    /// Loads the registry from `path`, falling back to the defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No channel file, using defaults");
            return Ok(Self::defaults());
        }

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let channels: Vec<ChannelConfig> =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(count = channels.len(), path = %path.display(), "Loaded channel config");
        Self::new(channels)
    }

    /// Loads the registry from the configured channels file.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&config::channels_file())
    }

    /// Writes the registry as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.channels).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Looks up a channel by chat id.
    pub fn get(&self, channel_id: i64) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }

    /// Looks up a channel by the page it feeds.
    pub fn by_page(&self, page_slug: &str) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.page_slug == page_slug)
    }

    /// Returns all channels.
    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    /// Returns the number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channel is monitored.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
