//! Upload request models.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use validator::{Validate, ValidationError};

use crate::visibility::Visibility;

/// Where the thumbnail image comes from.
#[derive(Clone)]
pub enum ThumbnailSource {
    /// Remote image, fetched with a streaming GET.
    Url(String),
    /// Image bytes received with the upload request.
    Binary { data: Bytes, mime_type: String },
}

impl ThumbnailSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ThumbnailSource::Url(_) => "url",
            ThumbnailSource::Binary { .. } => "binary",
        }
    }
}

impl fmt::Debug for ThumbnailSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThumbnailSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            ThumbnailSource::Binary { data, mime_type } => f
                .debug_struct("Binary")
                .field("len", &data.len())
                .field("mime_type", mime_type)
                .finish(),
        }
    }
}

/// A request to relay one video to the hosting platform.
///
/// Request-scoped: created when the HTTP call arrives and dropped once the
/// background task finishes.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    /// Source media URL (`frameLink` on the wire)
    #[validate(custom(function = "validate_source_url"))]
    pub source_url: String,

    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    pub description: String,

    pub tags: Vec<String>,

    pub thumbnail: Option<ThumbnailSource>,
}

impl UploadRequest {
    /// Create a new request. Leading and trailing whitespace is trimmed.
    pub fn new(source_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            title: title.into().trim().to_string(),
            description: String::new(),
            tags: Vec::new(),
            thumbnail: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<ThumbnailSource>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Build the platform metadata for this request.
    pub fn metadata(&self, visibility: Visibility) -> VideoMetadata {
        VideoMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            visibility,
            category_id: None,
        }
    }
}

fn validate_source_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid_url("frameLink is required"));
    }

    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(invalid_url("frameLink must be an http(s) URL")),
        Err(_) => Err(invalid_url("frameLink is not a valid URL")),
    }
}

fn invalid_url(message: &'static str) -> ValidationError {
    ValidationError::new("source_url").with_message(Cow::Borrowed(message))
}

/// Metadata sent with the create-video call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    /// Optional platform category (e.g. "22")
    pub category_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = UploadRequest::new("https://valid/video.mp4", "T");
        assert!(req.validate().is_ok());
        assert!(req.tags.is_empty());
        assert!(req.thumbnail.is_none());
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(UploadRequest::new("", "T").validate().is_err());
        assert!(UploadRequest::new("https://valid/video.mp4", "   ").validate().is_err());
    }

    #[test]
    fn test_non_http_url_rejected() {
        assert!(UploadRequest::new("ftp://host/video.mp4", "T").validate().is_err());
        assert!(UploadRequest::new("video.mp4", "T").validate().is_err());
    }

    #[test]
    fn test_metadata_uses_configured_visibility() {
        let req = UploadRequest::new("https://valid/video.mp4", "T")
            .with_description("d")
            .with_tags(vec!["a".into()]);
        let meta = req.metadata(Visibility::Unlisted);
        assert_eq!(meta.title, "T");
        assert_eq!(meta.description, "d");
        assert_eq!(meta.tags, vec!["a"]);
        assert_eq!(meta.visibility, Visibility::Unlisted);
    }

    #[test]
    fn test_binary_thumbnail_debug_hides_bytes() {
        let thumb = ThumbnailSource::Binary {
            data: Bytes::from_static(&[1, 2, 3]),
            mime_type: "image/png".into(),
        };
        let rendered = format!("{:?}", thumb);
        assert!(rendered.contains("len: 3"));
        assert_eq!(thumb.kind(), "binary");
    }
}
