use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{AppError, AppResult, AssetError, AssetResult};
use crate::utils::url::UrlUtils;

/// Blocking-until-complete byte retrieval for remote images
///
/// Implementations perform exactly one attempt per call. Any failure (transport
/// error, non-success status, empty body) is reported as an error; the cache
/// decides what to do with it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the raw bytes behind `url`
    async fn fetch_bytes(&self, url: &str) -> AssetResult<Bytes>;
}

/// Default implementation of ImageFetcher using reqwest
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher from the `[http]` configuration section
    pub fn from_config(config: &HttpConfig) -> AppResult<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone());

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_bytes(&self, url: &str) -> AssetResult<Bytes> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Fetching image bytes from: {}", safe_url);

        if !UrlUtils::is_http_url(url) {
            return Err(AssetError::fetch(safe_url, "not an absolute http(s) URL"));
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            AssetError::fetch(
                safe_url.clone(),
                UrlUtils::obfuscate_credentials(&e.to_string()),
            )
        })?;

        if !response.status().is_success() {
            return Err(AssetError::HttpStatus {
                url: safe_url,
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::fetch(safe_url.clone(), format!("Failed to read response: {e}")))?;

        if bytes.is_empty() {
            return Err(AssetError::EmptyBody { url: safe_url });
        }

        debug!("Fetched {} bytes from {}", bytes.len(), safe_url);
        Ok(bytes)
    }
}
