//! Upload intake handler.
//!
//! Accepts JSON or multipart bodies, validates them, hands the request to
//! the background executor and acknowledges before any upstream I/O.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use vrelay_models::{parse_tags, parse_tags_str, ThumbnailSource, UploadRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// MIME assumed for a binary thumbnail sent without a part content type.
const DEFAULT_THUMBNAIL_MIME: &str = "image/jpeg";

/// Immediate acknowledgment. The caller never gets another response.
#[derive(Debug, Serialize)]
pub struct UploadAcceptedResponse {
    pub status: &'static str,
}

impl UploadAcceptedResponse {
    pub fn started() -> Self {
        Self {
            status: "upload_started",
        }
    }
}

/// JSON body. Every field is optional here; presence is checked by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody {
    frame_link: Option<String>,
    title: Option<String>,
    description: Option<String>,
    /// Raw value so malformed tags degrade to `[]` instead of a 400
    tags: Option<Value>,
    thumbnail_url: Option<String>,
}

/// Upload form as received, before validation.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub frame_link: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_file: Option<ThumbnailSource>,
}

impl UploadForm {
    fn from_body(body: UploadBody) -> Self {
        Self {
            frame_link: body.frame_link.unwrap_or_default(),
            title: body.title.unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            tags: parse_tags(body.tags.as_ref()),
            thumbnail_url: body.thumbnail_url,
            thumbnail_file: None,
        }
    }

    async fn from_multipart(mut multipart: Multipart, max_thumbnail_bytes: usize) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().map(|s| s.to_string()).unwrap_or_default();

            match name.as_str() {
                "thumbnail" => {
                    let mime_type = field
                        .content_type()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| DEFAULT_THUMBNAIL_MIME.to_string());

                    let mut data = BytesMut::new();
                    while let Some(chunk) = field.chunk().await? {
                        if data.len() + chunk.len() > max_thumbnail_bytes {
                            return Err(ApiError::PayloadTooLarge(format!(
                                "thumbnail exceeds {} bytes",
                                max_thumbnail_bytes
                            )));
                        }
                        data.extend_from_slice(&chunk);
                    }

                    // Browsers send an empty part for an untouched file input
                    if !data.is_empty() {
                        form.thumbnail_file = Some(ThumbnailSource::Binary {
                            data: data.freeze(),
                            mime_type,
                        });
                    }
                }
                "frameLink" => form.frame_link = field.text().await?,
                "title" => form.title = field.text().await?,
                "description" => form.description = field.text().await?,
                "tags" => form.tags = parse_tags_str(&field.text().await?),
                "thumbnailUrl" => form.thumbnail_url = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate and convert into a pipeline request.
    ///
    /// A binary thumbnail wins over `thumbnailUrl` when both are sent.
    pub fn into_request(self) -> ApiResult<UploadRequest> {
        let thumbnail = self.thumbnail_file.or_else(|| {
            self.thumbnail_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .map(ThumbnailSource::Url)
        });

        let request = UploadRequest::new(self.frame_link, self.title)
            .with_description(self.description)
            .with_tags(self.tags)
            .with_thumbnail(thumbnail);

        request.validate()?;
        Ok(request)
    }
}

#[axum::async_trait]
impl FromRequest<AppState> for UploadForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            Self::from_multipart(multipart, state.config.max_thumbnail_bytes).await
        } else {
            let Json(body) = Json::<UploadBody>::from_request(req, state).await?;
            Ok(Self::from_body(body))
        }
    }
}

/// `POST /upload`
pub async fn upload(
    State(state): State<AppState>,
    form: UploadForm,
) -> ApiResult<Json<UploadAcceptedResponse>> {
    let request = form.into_request()?;

    let title = request.title.clone();
    let thumbnail = request.thumbnail.as_ref().map(|t| t.kind()).unwrap_or("none");

    // The handle is dropped: the task is detached from this request.
    let (job_id, _handle) = state.executor.submit(request);

    info!(
        job_id = %job_id,
        title = %title,
        thumbnail = thumbnail,
        "Upload accepted"
    );

    Ok(Json(UploadAcceptedResponse::started()))
}
