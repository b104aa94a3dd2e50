//! Error types for link handling.

use thiserror::Error;

/// Errors raised while resolving or scraping links.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The input is not an absolute http(s) URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Network or protocol failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The redirect chain exceeded the hop limit.
    #[error("too many redirects from {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// No product data could be extracted.
    #[error("no product data found at {0}")]
    EmptyPage(String),
}

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
