//! Affiliate link cleaning and per-network conversion.

use std::collections::HashMap;
use std::sync::Arc;

use pickntrust_models::{AffiliateNetwork, ChannelConfig};
use tracing::debug;
use url::Url;

use crate::patterns::{affiliate_patterns, host_of, host_matches};

/// Query parameters carrying another party's affiliate attribution.
const AFFILIATE_PARAMS: &[&str] = &[
    "tag",
    "ref",
    "affiliate",
    "partner",
    "cid",
    "source",
    "utm_source",
    "utm_medium",
    "utm_campaign",
];

/// Redirect services that wrap the destination in a `url` parameter.
const WRAPPER_HOSTS: &[&str] = &["linksredirect.com", "inrdeals.com", "earnkaro.com"];

/// Default Cuelinks campaign id.
pub const DEFAULT_CUELINKS_CID: &str = "243942";

/// Default Amazon associate tag.
pub const DEFAULT_AMAZON_TAG: &str = "pickntrust03-21";

/// Returns true if the URL already carries affiliate attribution.
pub fn is_affiliate_url(url: &str) -> bool {
    affiliate_patterns().iter().any(|p| p.matches(url))
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Strips affiliate attribution from a URL.
///
/// Wrapper links are unwrapped to their destination; otherwise the known
/// affiliate parameters are dropped. Unparseable input loses its query string.
pub fn clean_affiliate_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.split('?').next().unwrap_or(url).to_string();
    };

    let is_wrapper = host_of(url).is_some_and(|host| WRAPPER_HOSTS.iter().any(|d| host_matches(&host, d)));
    if is_wrapper {
        if let Some((_, inner)) = parsed.query_pairs().find(|(k, _)| k == "url") {
            return inner.into_owned();
        }
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !AFFILIATE_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    set_query(&mut parsed, &kept);
    parsed.to_string()
}

fn set_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// Converts a product URL into an affiliate URL for one network.
pub trait LinkConverter: Send + Sync {
    /// The network this converter produces links for.
    fn network(&self) -> AffiliateNetwork;

    /// Converts `url`, using the channel's tag when the network needs one.
    fn convert(&self, url: &str, tag: Option<&str>) -> String;
}

/// Amazon associates: sets `tag` and the standard link parameters.
pub struct AmazonConverter;

impl LinkConverter for AmazonConverter {
    fn network(&self) -> AffiliateNetwork {
        AffiliateNetwork::Amazon
    }

    fn convert(&self, url: &str, tag: Option<&str>) -> String {
        let tag = tag.unwrap_or(DEFAULT_AMAZON_TAG);
        let clean = clean_affiliate_url(url);
        let params = [
            ("tag", tag),
            ("linkCode", "as2"),
            ("camp", "1789"),
            ("creative", "9325"),
        ];

        match Url::parse(&clean) {
            Ok(mut parsed) => {
                let mut pairs: Vec<(String, String)> = parsed
                    .query_pairs()
                    .filter(|(k, _)| !params.iter().any(|(p, _)| k == p))
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                pairs.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
                set_query(&mut parsed, &pairs);
                parsed.to_string()
            }
            Err(_) => {
                let base = clean.split('?').next().unwrap_or(&clean);
                format!("{}?tag={}&linkCode=as2&camp=1789&creative=9325", base, tag)
            }
        }
    }
}

/// Cuelinks: wraps the destination in a linksredirect URL.
pub struct CuelinksConverter;

impl LinkConverter for CuelinksConverter {
    fn network(&self) -> AffiliateNetwork {
        AffiliateNetwork::Cuelinks
    }

    fn convert(&self, url: &str, tag: Option<&str>) -> String {
        format!(
            "https://linksredirect.com/?cid={}&source=linkkit&url={}",
            tag.unwrap_or(DEFAULT_CUELINKS_CID),
            encode(&clean_affiliate_url(url))
        )
    }
}

/// INRDeals: redirect URL with the channel tag appended verbatim.
pub struct InrdealsConverter;

impl LinkConverter for InrdealsConverter {
    fn network(&self) -> AffiliateNetwork {
        AffiliateNetwork::Inrdeals
    }

    fn convert(&self, url: &str, tag: Option<&str>) -> String {
        let base = format!(
            "https://inrdeals.com/redirect?url={}",
            encode(&clean_affiliate_url(url))
        );
        match tag {
            Some(tag) => format!("{}&{}", base, tag),
            None => base,
        }
    }
}

/// EarnKaro: redirect URL.
pub struct EarnkaroConverter;

impl LinkConverter for EarnkaroConverter {
    fn network(&self) -> AffiliateNetwork {
        AffiliateNetwork::Earnkaro
    }

    fn convert(&self, url: &str, _tag: Option<&str>) -> String {
        format!(
            "https://earnkaro.com/api/redirect?url={}",
            encode(&clean_affiliate_url(url))
        )
    }
}

/// DeoDap: appends the referral parameter to the product URL.
pub struct DeodapConverter;

impl LinkConverter for DeodapConverter {
    fn network(&self) -> AffiliateNetwork {
        AffiliateNetwork::Deodap
    }

    fn convert(&self, url: &str, tag: Option<&str>) -> String {
        let clean = clean_affiliate_url(url);
        match tag {
            Some(tag) => {
                let sep = if clean.contains('?') { '&' } else { '?' };
                format!("{}{}{}", clean, sep, tag)
            }
            None => clean,
        }
    }
}

/// Outcome of converting a link for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub original_url: String,
    pub affiliate_url: String,
    /// Network used, `None` when the channel keeps links untouched.
    pub network: Option<AffiliateNetwork>,
}

impl Conversion {
    /// Returns true if the URL was rewritten.
    pub fn is_converted(&self) -> bool {
        self.network.is_some()
    }
}

/// Registry of link converters keyed by network.
pub struct ConverterRegistry {
    converters: HashMap<AffiliateNetwork, Arc<dyn LinkConverter>>,
}

impl ConverterRegistry {
    /// Creates a registry with all built-in converters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(AmazonConverter));
        registry.register(Arc::new(CuelinksConverter));
        registry.register(Arc::new(InrdealsConverter));
        registry.register(Arc::new(EarnkaroConverter));
        registry.register(Arc::new(DeodapConverter));
        registry
    }

    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registers a converter, replacing any previous one for its network.
    pub fn register(&mut self, converter: Arc<dyn LinkConverter>) {
        self.converters.insert(converter.network(), converter);
    }

    /// Gets the converter for a network.
    pub fn get(&self, network: AffiliateNetwork) -> Option<Arc<dyn LinkConverter>> {
        self.converters.get(&network).cloned()
    }

    /// Returns the number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns true if no converters are registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Converts `url` for the channel's network.
    ///
    /// Channels with conversion disabled keep the URL as posted. Networks
    /// without a registered converter fall back to Cuelinks.
    pub fn convert(&self, url: &str, channel: &ChannelConfig) -> Conversion {
        if !channel.convert_links {
            return Conversion {
                original_url: url.to_string(),
                affiliate_url: url.to_string(),
                network: None,
            };
        }

        let network = channel.effective_network();
        let converter = self
            .get(network)
            .or_else(|| self.get(AffiliateNetwork::Cuelinks));
        let Some(converter) = converter else {
            return Conversion {
                original_url: url.to_string(),
                affiliate_url: url.to_string(),
                network: None,
            };
        };

        // Tags are network specific; a tag configured for the channel's
        // primary network is not reused for a fallback.
        let tag = if converter.network() == channel.network {
            channel.affiliate_tag.as_deref()
        } else {
            None
        };
        let affiliate_url = converter.convert(url, tag);
        debug!(network = %converter.network(), channel = channel.channel_id, "Converted affiliate link");

        Conversion {
            original_url: url.to_string(),
            affiliate_url,
            network: Some(converter.network()),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(network: AffiliateNetwork) -> ChannelConfig {
        ChannelConfig::new(-100, "Test", "test-picks", network)
    }

    #[test]
    fn test_is_affiliate_url() {
        assert!(is_affiliate_url("https://www.amazon.in/dp/B0X?tag=someone-21"));
        assert!(is_affiliate_url("https://linksredirect.com/?cid=1&url=x"));
        assert!(!is_affiliate_url("https://www.amazon.in/dp/B0CX23V2ZK"));
    }

    #[test]
    fn test_clean_drops_affiliate_params() {
        let cleaned = clean_affiliate_url(
            "https://www.amazon.in/dp/B0CX23V2ZK?tag=other-21&th=1&utm_source=tg",
        );
        assert_eq!(cleaned, "https://www.amazon.in/dp/B0CX23V2ZK?th=1");

        let bare = clean_affiliate_url("https://www.amazon.in/dp/B0CX23V2ZK?tag=other-21");
        assert_eq!(bare, "https://www.amazon.in/dp/B0CX23V2ZK");
    }

    #[test]
    fn test_clean_unwraps_redirects() {
        let wrapped = "https://linksredirect.com/?cid=1&source=linkkit&url=https%3A%2F%2Fwww.flipkart.com%2Fp%2Fitm1";
        assert_eq!(clean_affiliate_url(wrapped), "https://www.flipkart.com/p/itm1");
    }

    #[test]
    fn test_clean_unparseable() {
        assert_eq!(clean_affiliate_url("not a url?tag=x"), "not a url");
    }

    #[test]
    fn test_amazon_conversion() {
        let url = AmazonConverter.convert("https://www.amazon.in/dp/B0CX23V2ZK?tag=other-21", Some("pickntrust03-21"));
        assert_eq!(
            url,
            "https://www.amazon.in/dp/B0CX23V2ZK?tag=pickntrust03-21&linkCode=as2&camp=1789&creative=9325"
        );
    }

    #[test]
    fn test_cuelinks_conversion() {
        let url = CuelinksConverter.convert("https://www.flipkart.com/p/itm1", None);
        assert_eq!(
            url,
            "https://linksredirect.com/?cid=243942&source=linkkit&url=https%3A%2F%2Fwww.flipkart.com%2Fp%2Fitm1"
        );
    }

    #[test]
    fn test_inrdeals_conversion_appends_tag() {
        let url = InrdealsConverter.convert("https://www.nykaa.com/x", Some("id=sha678089037"));
        assert_eq!(
            url,
            "https://inrdeals.com/redirect?url=https%3A%2F%2Fwww.nykaa.com%2Fx&id=sha678089037"
        );
    }

    #[test]
    fn test_deodap_conversion() {
        assert_eq!(
            DeodapConverter.convert("https://deodap.in/products/jar", Some("ref=sicvppak")),
            "https://deodap.in/products/jar?ref=sicvppak"
        );
        assert_eq!(
            DeodapConverter.convert("https://deodap.in/products/jar?variant=2", Some("ref=sicvppak")),
            "https://deodap.in/products/jar?variant=2&ref=sicvppak"
        );
    }

    #[test]
    fn test_registry_respects_disabled_conversion() {
        let registry = ConverterRegistry::new();
        let loot_box = channel(AffiliateNetwork::Deodap).without_conversion();
        let result = registry.convert("https://deodap.in/products/jar", &loot_box);
        assert!(!result.is_converted());
        assert_eq!(result.affiliate_url, "https://deodap.in/products/jar");
    }

    #[test]
    fn test_registry_multiple_uses_first_network() {
        let registry = ConverterRegistry::new();
        let mixed = channel(AffiliateNetwork::Multiple)
            .with_networks(vec![AffiliateNetwork::Earnkaro, AffiliateNetwork::Cuelinks]);
        let result = registry.convert("https://www.ajio.com/p/1", &mixed);
        assert_eq!(result.network, Some(AffiliateNetwork::Earnkaro));
        assert!(result.affiliate_url.starts_with("https://earnkaro.com/api/redirect?url="));
    }

    #[test]
    fn test_registry_falls_back_to_cuelinks() {
        let mut registry = ConverterRegistry::empty();
        registry.register(Arc::new(CuelinksConverter));
        let result = registry.convert("https://www.ajio.com/p/1", &channel(AffiliateNetwork::Amazon).with_tag("x-21"));
        assert_eq!(result.network, Some(AffiliateNetwork::Cuelinks));
        assert!(result.affiliate_url.contains("cid=243942"));
    }
}
