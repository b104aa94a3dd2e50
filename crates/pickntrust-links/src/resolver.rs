//! Redirect resolution for shortened and wrapped links.

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::{LinkError, Result};
use crate::patterns::is_shortened;
use crate::platform::Platform;

/// Browser user agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Maximum redirect hops followed.
pub const MAX_REDIRECTS: usize = 10;

/// Request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A URL with its redirect chain followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub original: String,
    pub final_url: String,
    /// Every URL visited, starting with `original`.
    pub chain: Vec<String>,
    pub is_shortened: bool,
    pub platform: Platform,
    pub product_id: Option<String>,
}

impl ResolvedUrl {
    /// A resolution that stayed on the given URL.
    pub fn unresolved(url: &str) -> Self {
        let platform = Platform::detect(url);
        Self {
            original: url.to_string(),
            final_url: url.to_string(),
            chain: vec![url.to_string()],
            is_shortened: is_shortened(url),
            product_id: platform.product_id(url),
            platform,
        }
    }
}

/// Builds the HTTP client shared by the resolver and the scraper.
pub fn build_client(follow_redirects: bool) -> Result<Client> {
    let policy = if follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };
    Ok(Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .redirect(policy)
        .build()?)
}

/// Computes the next hop from a `Location` header value.
pub fn redirect_target(current: &str, location: &str) -> Result<String> {
    let base = Url::parse(current).map_err(|_| LinkError::InvalidUrl(current.to_string()))?;
    base.join(location.trim())
        .map(|u| u.to_string())
        .map_err(|_| LinkError::InvalidUrl(location.to_string()))
}

/// Follows redirects hop by hop so the whole chain is recorded.
#[derive(Clone)]
pub struct UrlResolver {
    client: Client,
    max_redirects: usize,
}

impl UrlResolver {
    /// Creates a resolver with the default hop limit.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client(false)?,
            max_redirects: MAX_REDIRECTS,
        })
    }

    async fn next_hop(&self, url: &str) -> Result<Option<String>> {
        let response = match self.client.head(url).send().await {
            Ok(resp) if resp.status() != StatusCode::METHOD_NOT_ALLOWED
                && resp.status() != StatusCode::FORBIDDEN =>
            {
                resp
            }
            Ok(resp) => {
                debug!(url, status = %resp.status(), "HEAD rejected, retrying with GET");
                self.client.get(url).send().await?
            }
            Err(e) => {
                debug!(url, error = %e, "HEAD failed, retrying with GET");
                self.client.get(url).send().await?
            }
        };

        if !response.status().is_redirection() {
            return Ok(None);
        }
        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(None);
        };
        redirect_target(url, location).map(Some)
    }

    /// Resolves `url` to its final destination.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedUrl> {
        if Url::parse(url).is_err() {
            return Err(LinkError::InvalidUrl(url.to_string()));
        }

        let mut chain = vec![url.to_string()];
        let mut current = url.to_string();

        loop {
            let Some(next) = self.next_hop(&current).await? else {
                break;
            };
            if chain.contains(&next) {
                warn!(url, next = %next, "Redirect loop detected");
                break;
            }
            if chain.len() > self.max_redirects {
                return Err(LinkError::TooManyRedirects {
                    url: url.to_string(),
                    limit: self.max_redirects,
                });
            }
            chain.push(next.clone());
            current = next;
        }

        let platform = Platform::detect(&current);
        debug!(url, final_url = %current, hops = chain.len() - 1, "Resolved URL");
        Ok(ResolvedUrl {
            original: url.to_string(),
            product_id: platform.product_id(&current),
            final_url: current,
            chain,
            is_shortened: is_shortened(url),
            platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target_absolute() {
        let next = redirect_target("https://amzn.to/abc", "https://www.amazon.in/dp/B0CX23V2ZK").unwrap();
        assert_eq!(next, "https://www.amazon.in/dp/B0CX23V2ZK");
    }

    #[test]
    fn test_redirect_target_relative() {
        let next = redirect_target("https://dl.flipkart.com/s/abc", "/p/itm1?pid=X").unwrap();
        assert_eq!(next, "https://dl.flipkart.com/p/itm1?pid=X");
    }

    #[test]
    fn test_redirect_target_invalid_base() {
        assert!(matches!(
            redirect_target("nope", "/x"),
            Err(LinkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_unresolved() {
        let resolved = ResolvedUrl::unresolved("https://www.amazon.in/dp/B0CX23V2ZK");
        assert_eq!(resolved.platform, Platform::Amazon);
        assert_eq!(resolved.product_id.as_deref(), Some("B0CX23V2ZK"));
        assert_eq!(resolved.chain.len(), 1);
        assert!(!resolved.is_shortened);
    }

    #[tokio::test]
    async fn test_resolve_rejects_invalid_url() {
        let resolver = UrlResolver::new().unwrap();
        assert!(matches!(
            resolver.resolve("not a url").await,
            Err(LinkError::InvalidUrl(_))
        ));
    }
}
