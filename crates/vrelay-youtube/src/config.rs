//! YouTube client configuration.

use std::time::Duration;

/// Default Google API host for both upload and data endpoints.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Configuration for the YouTube client.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Base URL for API calls
    pub api_base: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Connect timeout for all platform calls
    pub connect_timeout: Duration,
    /// Timeout for metadata, token and thumbnail calls (not the media PUT)
    pub request_timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl YouTubeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("YOUTUBE_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            token_url: std::env::var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("YOUTUBE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("YOUTUBE_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }

    /// URL that starts a resumable video upload session.
    pub fn resumable_insert_url(&self) -> String {
        format!("{}/upload/youtube/v3/videos", self.api_base)
    }

    /// URL of the thumbnail upload endpoint.
    pub fn thumbnail_set_url(&self) -> String {
        format!("{}/upload/youtube/v3/thumbnails/set", self.api_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = YouTubeConfig::default();
        assert_eq!(config.api_base, "https://www.googleapis.com");
        assert_eq!(
            config.resumable_insert_url(),
            "https://www.googleapis.com/upload/youtube/v3/videos"
        );
        assert_eq!(
            config.thumbnail_set_url(),
            "https://www.googleapis.com/upload/youtube/v3/thumbnails/set"
        );
    }
}
