//! Outcome notification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use vrelay_models::NotificationPayload;

use crate::error::{NotifyError, NotifyResult};

/// Delivers a terminal upload outcome to a downstream receiver.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one payload. Called at most once per upload, never retried.
    async fn notify(&self, payload: &NotificationPayload) -> NotifyResult<()>;
}

/// Posts outcome payloads as JSON to a webhook URL.
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a new webhook notifier.
    pub fn new(url: impl Into<String>, timeout: Duration) -> NotifyResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, payload: &NotificationPayload) -> NotifyResult<()> {
        let response = self.http.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        debug!("Webhook accepted notification ({})", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_success_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({"status": "success", "videoId": "abc123", "title": "T"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(format!("{}/hook", server.uri()), Duration::from_secs(5)).unwrap();
        let payload = NotificationPayload::Success {
            video_id: "abc123".into(),
            title: "T".into(),
        };

        notifier.notify(&payload).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(format!("{}/hook", server.uri()), Duration::from_secs(5)).unwrap();
        let payload = NotificationPayload::Failed {
            error: "boom".into(),
        };

        let err = notifier.notify(&payload).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(500)));
    }
}
