//! Mock page fetcher for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{fixtures, lock};
use crate::fetcher::{FetchError, PageFetcher};

/// Mock implementation of the PageFetcher trait.
///
/// Serves configured documents by URL, answers 404 for anything else and
/// records every requested URL.
#[derive(Debug, Default)]
pub struct MockPageFetcher {
    documents: Mutex<HashMap<String, String>>,
    json: Mutex<HashMap<String, serde_json::Value>>,
    requests: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `markup` at `url`.
    pub fn set_document(&self, url: &str, markup: String) {
        lock(&self.documents).insert(url.to_string(), markup);
    }

    /// Serve `value` as JSON at `url`.
    pub fn set_json(&self, url: &str, value: serde_json::Value) {
        lock(&self.json).insert(url.to_string(), value);
    }

    /// Serve an index page reporting `total_pages` at the fixture index URL.
    pub fn set_index(&self, total_pages: u32) {
        self.set_document(
            &fixtures::listing_config().index_url,
            fixtures::index_page(total_pages),
        );
    }

    /// Serve `markup` as listing page `page` of the fixture config.
    pub fn set_page(&self, page: u32, markup: String) {
        self.set_document(&fixtures::page_url(page), markup);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// All URLs requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        lock(&self.requests).iter().filter(|u| *u == url).count()
    }

    async fn record(&self, url: &str) {
        lock(&self.requests).push(url.to_string());
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        self.record(url).await;
        lock(&self.documents)
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        self.record(url).await;
        lock(&self.json)
            .get(url)
            .cloned()
            .ok_or_else(|| Self::not_found(url))
    }
}
