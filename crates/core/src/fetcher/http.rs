//! reqwest-backed page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use super::{FetchError, PageFetcher};
use crate::config::ListingConfig;

/// HTTP page fetcher.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the listing's user agent and timeout.
    pub fn new(config: &ListingConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::NotConfigured(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self.get(url).await?;
        response.json().await.map_err(|e| FetchError::Json {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
