//! HTTP source fetcher.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::stream::SourceStream;

/// Opens streaming reads of remote media.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Open a stream over the bytes at `url`.
    ///
    /// Fails on network errors, timeouts and non-2xx responses. Never retried.
    async fn open_stream(&self, url: &str) -> FetchResult<SourceStream>;
}

/// Configuration for the HTTP source fetcher.
#[derive(Debug, Clone)]
pub struct SourceFetcherConfig {
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Maximum idle time between body chunks
    pub read_timeout: Duration,
}

impl Default for SourceFetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(300),
        }
    }
}

impl SourceFetcherConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            connect_timeout: Duration::from_secs(
                std::env::var("SOURCE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            read_timeout: Duration::from_secs(
                std::env::var("SOURCE_READ_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}

/// Source fetcher backed by reqwest.
///
/// No overall request timeout is set: large videos may legitimately take a
/// long time, only stalls are cut off.
#[derive(Clone)]
pub struct HttpSourceFetcher {
    http: Client,
}

impl HttpSourceFetcher {
    /// Create a new fetcher.
    pub fn new(config: SourceFetcherConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self { http })
    }

    /// Create from environment variables.
    pub fn from_env() -> FetchResult<Self> {
        Self::new(SourceFetcherConfig::from_env())
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn open_stream(&self, url: &str) -> FetchResult<SourceStream> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        debug!("Opening source stream: {}", parsed);

        let response = self.http.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = url, "Source returned non-success status");
            return Err(FetchError::bad_status(status.as_u16(), url));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();

        let body = response.bytes_stream().map_err(FetchError::from).boxed();

        Ok(SourceStream::new(body, content_type, content_length))
    }
}
