//! Upload outcomes and the webhook payload derived from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Terminal result of one upload. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadOutcome {
    Success { video_id: String, title: String },
    Failure { reason: String },
}

impl UploadOutcome {
    pub fn success(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        UploadOutcome::Success {
            video_id: video_id.into(),
            title: title.into(),
        }
    }

    /// Create a failure. An empty reason is replaced with a generic one.
    pub fn failure(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "Upload failed".to_string()
        } else {
            reason
        };
        UploadOutcome::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn video_id(&self) -> Option<&str> {
        match self {
            UploadOutcome::Success { video_id, .. } => Some(video_id),
            UploadOutcome::Failure { .. } => None,
        }
    }
}

/// Body POSTed to the notification webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status")]
pub enum NotificationPayload {
    #[serde(rename = "success")]
    Success {
        #[serde(rename = "videoId")]
        video_id: String,
        title: String,
    },
    #[serde(rename = "failed")]
    Failed { error: String },
}

impl From<&UploadOutcome> for NotificationPayload {
    fn from(outcome: &UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Success { video_id, title } => NotificationPayload::Success {
                video_id: video_id.clone(),
                title: title.clone(),
            },
            UploadOutcome::Failure { reason } => NotificationPayload::Failed {
                error: reason.clone(),
            },
        }
    }
}
