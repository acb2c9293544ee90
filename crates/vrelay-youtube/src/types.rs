//! YouTube Data API request/response types.

use serde::{Deserialize, Serialize};

use vrelay_models::VideoMetadata;

/// Body of the resumable `videos.insert` initiation call.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInsertBody {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: String,
}

impl From<&VideoMetadata> for VideoInsertBody {
    fn from(meta: &VideoMetadata) -> Self {
        Self {
            snippet: VideoSnippet {
                title: meta.title.clone(),
                description: meta.description.clone(),
                tags: meta.tags.clone(),
                category_id: meta.category_id.clone(),
            },
            status: VideoStatus {
                privacy_status: meta.visibility.as_str().to_string(),
            },
        }
    }
}

/// Video resource returned once the upload completes.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoResource {
    pub id: Option<String>,
}

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorEnvelope {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub code: Option<u16>,
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<GoogleErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorItem {
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// OAuth token endpoint success response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// OAuth token endpoint error response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}
