//! Platform error types.

use thiserror::Error;

use crate::types::GoogleErrorEnvelope;

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("{message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlatformError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify a non-success platform response.
    ///
    /// Uses the structured Google error message when the body carries one,
    /// else falls back to the status line and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let envelope = serde_json::from_str::<GoogleErrorEnvelope>(body).ok();
        let reason = envelope
            .as_ref()
            .and_then(|e| e.error.errors.first())
            .and_then(|item| item.reason.clone());
        let message = envelope
            .and_then(|e| e.error.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| generic_message(status, body));

        if status == 404 || reason.as_deref() == Some("videoNotFound") {
            return Self::VideoNotFound(message);
        }
        if status == 401 {
            return Self::Auth(message);
        }

        Self::Api {
            status,
            reason,
            message,
        }
    }

    /// True when the platform does not (yet) know the referenced video.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::VideoNotFound(_))
    }

    /// HTTP status reported by the platform, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PlatformError::Auth(_) => Some(401),
            PlatformError::VideoNotFound(_) => Some(404),
            PlatformError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn generic_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("Platform returned HTTP {}", status)
    } else {
        format!("Platform returned HTTP {}: {}", status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_message_preferred() {
        let body = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota.","errors":[{"reason":"quotaExceeded"}]}}"#;
        let err = PlatformError::from_response(403, body);
        assert_eq!(
            err.to_string(),
            "The request cannot be completed because you have exceeded your quota."
        );
        assert!(matches!(
            err,
            PlatformError::Api { status: 403, reason: Some(ref r), .. } if r == "quotaExceeded"
        ));
    }

    #[test]
    fn test_generic_message_fallback() {
        let err = PlatformError::from_response(502, "bad gateway");
        assert_eq!(err.to_string(), "Platform returned HTTP 502: bad gateway");

        let err = PlatformError::from_response(500, "");
        assert_eq!(err.to_string(), "Platform returned HTTP 500");
    }

    #[test]
    fn test_not_found_classification() {
        let body = r#"{"error":{"code":404,"message":"The video identified by the videoId parameter could not be found.","errors":[{"reason":"videoNotFound"}]}}"#;
        let err = PlatformError::from_response(404, body);
        assert!(err.is_not_found());
        assert_eq!(err.http_status(), Some(404));

        let err = PlatformError::from_response(400, r#"{"error":{"message":"x","errors":[{"reason":"videoNotFound"}]}}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = PlatformError::from_response(401, r#"{"error":{"message":"Invalid Credentials"}}"#);
        assert!(matches!(err, PlatformError::Auth(_)));
        assert_eq!(err.to_string(), "Authentication failed: Invalid Credentials");
    }
}
