//! Remote page retrieval.
//!
//! The listing scraper only needs "give me the document at this URL"; this
//! module provides the trait it depends on and the reqwest-backed
//! implementation used in production.

mod http;

pub use http::HttpPageFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when fetching a remote page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, body read).
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body could not be decoded as JSON.
    #[error("Failed to parse JSON from {url}: {message}")]
    Json { url: String, message: String },

    /// Client could not be built.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Fetches documents and JSON values by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the markup of the page at `url`.
    async fn fetch_document(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch and decode a JSON value from `url`.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}
