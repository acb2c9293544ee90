//! YouTube upload client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use vrelay_models::VideoMetadata;
use vrelay_source::SourceStream;

use crate::auth::TokenCache;
use crate::config::YouTubeConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::types::{VideoInsertBody, VideoResource};

/// Content type announced when the source does not report one.
const FALLBACK_VIDEO_CONTENT_TYPE: &str = "video/*";

/// Content type used for thumbnails when the source does not report one.
const FALLBACK_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Video hosting platform operations used by the upload pipeline.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Create a video from a media stream and return its platform ID.
    ///
    /// The stream is piped straight into the upload transport.
    async fn create_video(
        &self,
        media: SourceStream,
        metadata: &VideoMetadata,
    ) -> PlatformResult<String>;

    /// Attach a thumbnail image to an existing video.
    async fn set_thumbnail(&self, video_id: &str, image: SourceStream) -> PlatformResult<()>;
}

/// YouTube Data API v3 client.
///
/// Constructed explicitly with its token cache; nothing is global.
pub struct YouTubeClient {
    http: Client,
    config: YouTubeConfig,
    tokens: Arc<TokenCache>,
}

impl YouTubeClient {
    /// Create a new client.
    pub fn new(config: YouTubeConfig, tokens: Arc<TokenCache>) -> PlatformResult<Self> {
        // No client-wide timeout: the media PUT runs as long as the source does.
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables.
    pub fn from_env(credentials: crate::auth::Credentials) -> PlatformResult<Self> {
        let config = YouTubeConfig::from_env();
        let token_http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        let tokens = Arc::new(TokenCache::new(token_http, config.token_url.clone(), credentials));
        Self::new(config, tokens)
    }

    /// Start a resumable upload session and return the session URL.
    async fn start_upload_session(
        &self,
        token: &str,
        content_type: Option<&str>,
        content_length: Option<u64>,
        metadata: &VideoMetadata,
    ) -> PlatformResult<String> {
        let mut request = self
            .http
            .post(self.config.resumable_insert_url())
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(token)
            .timeout(self.config.request_timeout)
            .header(
                "X-Upload-Content-Type",
                content_type.unwrap_or(FALLBACK_VIDEO_CONTENT_TYPE),
            )
            .json(&VideoInsertBody::from(metadata));

        if let Some(len) = content_length {
            request = request.header("X-Upload-Content-Length", len.to_string());
        }

        let response = self.check(request.send().await?).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| PlatformError::invalid_response("no Location header on upload session"))
    }

    /// Map non-success responses to typed errors, dropping a stale token on 401.
    async fn check(&self, response: Response) -> PlatformResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = PlatformError::from_response(status.as_u16(), &body);
        if matches!(err, PlatformError::Auth(_)) {
            self.tokens.invalidate().await;
        }
        Err(err)
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn create_video(
        &self,
        media: SourceStream,
        metadata: &VideoMetadata,
    ) -> PlatformResult<String> {
        let token = self.tokens.get_token().await?;

        let session_url = self
            .start_upload_session(&token, media.content_type(), media.content_length(), metadata).await?;
        debug!("Opened resumable upload session");

        let mut request = self
            .http
            .put(&session_url)
            .bearer_auth(&token)
            .header(
                CONTENT_TYPE,
                media.content_type().unwrap_or(FALLBACK_VIDEO_CONTENT_TYPE),
            );

        if let Some(len) = media.content_length() {
            request = request.header(CONTENT_LENGTH, len);
        }

        let response = request.body(media.into_body()).send().await?;
        let response = self.check(response).await?;

        let video: VideoResource = response.json().await?;
        let video_id = video
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::invalid_response("no id in upload response"))?;

        info!(video_id = %video_id, visibility = %metadata.visibility, "Video created on platform");
        Ok(video_id)
    }

    async fn set_thumbnail(&self, video_id: &str, image: SourceStream) -> PlatformResult<()> {
        let token = self.tokens.get_token().await?;

        let mut request = self
            .http
            .post(self.config.thumbnail_set_url())
            .query(&[("videoId", video_id), ("uploadType", "media")])
            .bearer_auth(&token)
            .timeout(self.config.request_timeout)
            .header(
                CONTENT_TYPE,
                image.content_type().unwrap_or(FALLBACK_IMAGE_CONTENT_TYPE),
            );

        if let Some(len) = image.content_length() {
            request = request.header(CONTENT_LENGTH, len);
        }

        match self.check(request.body(image.into_body()).send().await?).await {
            Ok(_) => {
                debug!(video_id = video_id, "Thumbnail attached");
                Ok(())
            }
            Err(e) => {
                warn!(video_id = video_id, error = %e, "Thumbnail upload rejected");
                Err(e)
            }
        }
    }
}
