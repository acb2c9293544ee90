//! Source fetch error types.

use thiserror::Error;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("Source returned HTTP {status} for {url}")]
    BadStatus { status: u16, url: String },

    #[error("Source request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(reqwest::Error),
}

impl FetchError {
    pub fn bad_status(status: u16, url: impl Into<String>) -> Self {
        Self::BadStatus {
            status,
            url: url.into(),
        }
    }

    /// HTTP status returned by the source, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Network(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_message() {
        let err = FetchError::bad_status(404, "https://valid/video.mp4");
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "Source returned HTTP 404 for https://valid/video.mp4"
        );
    }
}
