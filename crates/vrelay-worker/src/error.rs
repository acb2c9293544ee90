//! Worker error types.

use thiserror::Error;

use vrelay_source::FetchError;
use vrelay_youtube::PlatformError;

pub type RelayResult<T> = Result<T, RelayError>;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that end an upload with a Failure outcome.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to fetch source video: {0}")]
    Fetch(#[from] FetchError),

    #[error("Upload rejected by platform: {0}")]
    Platform(#[from] PlatformError),

    #[error("Upload task aborted: {0}")]
    Aborted(String),
}

impl RelayError {
    /// Human-readable reason for the Failure outcome. Never empty.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Upload failed".to_string()
        } else {
            message
        }
    }

    /// Pipeline stage label for logs and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            RelayError::Fetch(_) => "fetch",
            RelayError::Platform(_) => "upload",
            RelayError::Aborted(_) => "aborted",
        }
    }
}

/// Thumbnail step errors. Reported, never fatal to the upload.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Failed to fetch thumbnail: {0}")]
    Fetch(#[from] FetchError),

    #[error("Platform rejected thumbnail: {0}")]
    Platform(#[from] PlatformError),
}

impl ThumbnailError {
    /// True while the platform has not yet caught up with the new video.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ThumbnailError::Platform(e) if e.is_not_found())
    }
}

/// Webhook delivery errors. Always logged and swallowed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook returned HTTP {0}")]
    Rejected(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
