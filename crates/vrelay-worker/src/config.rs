//! Relay configuration.

use std::time::Duration;

use tracing::warn;

use vrelay_models::Visibility;

use crate::retry::RetryConfig;

/// Configuration for the upload pipeline.
///
/// Read once at startup and shared read-only by every upload.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Privacy status applied to every created video
    pub visibility: Visibility,
    /// Optional platform category for created videos
    pub category_id: Option<String>,
    /// Outcome notification target; `None` disables notification
    pub webhook_url: Option<String>,
    /// Timeout for the notification POST
    pub webhook_timeout: Duration,
    /// Fixed wait before the first thumbnail attempt
    pub thumbnail_settle_delay: Duration,
    /// Retries while the platform still reports the new video as missing
    pub thumbnail_max_retries: u32,
    /// Base delay for thumbnail retry backoff
    pub thumbnail_retry_base: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            category_id: None,
            webhook_url: None,
            webhook_timeout: Duration::from_secs(10),
            thumbnail_settle_delay: Duration::ZERO,
            thumbnail_max_retries: 4,
            thumbnail_retry_base: Duration::from_millis(2000),
        }
    }
}

impl RelayConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let visibility = match std::env::var("UPLOAD_VISIBILITY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, Visibility::default());
                Visibility::default()
            }),
            Err(_) => Visibility::default(),
        };

        Self {
            visibility,
            category_id: std::env::var("YOUTUBE_CATEGORY_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            webhook_url: std::env::var("N8N_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            webhook_timeout: Duration::from_secs(
                std::env::var("WEBHOOK_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            thumbnail_settle_delay: Duration::from_millis(
                std::env::var("THUMBNAIL_SETTLE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
            ),
            thumbnail_max_retries: std::env::var("THUMBNAIL_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            thumbnail_retry_base: Duration::from_millis(
                std::env::var("THUMBNAIL_RETRY_BASE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
        }
    }

    /// Retry policy for the thumbnail step.
    pub fn thumbnail_retry(&self) -> RetryConfig {
        RetryConfig::new("thumbnail_attach")
            .with_max_retries(self.thumbnail_max_retries)
            .with_base_delay(self.thumbnail_retry_base)
            .with_max_delay(self.thumbnail_retry_base.saturating_mul(8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.visibility, Visibility::Public);
        assert!(config.webhook_url.is_none());
        assert_eq!(config.thumbnail_settle_delay, Duration::ZERO);
        assert_eq!(config.thumbnail_max_retries, 4);
    }

    #[test]
    fn test_thumbnail_retry_policy() {
        let retry = RelayConfig::default().thumbnail_retry();
        assert_eq!(retry.max_retries, 4);
        assert_eq!(retry.base_delay, Duration::from_millis(2000));
        assert_eq!(retry.max_delay, Duration::from_millis(16000));
    }
}
