//! Upload pipeline.
//!
//! One run per accepted request:
//!
//! ```text
//! Pending -> Fetching -> Uploading -> [ThumbnailPending -> ThumbnailDone|ThumbnailFailed]
//!         -> Notifying -> Terminal
//! ```
//!
//! A fetch or upload failure jumps straight to `Notifying` with a Failure
//! outcome. A thumbnail failure still notifies Success: the video exists.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use vrelay_models::{JobId, NotificationPayload, ThumbnailSource, UploadOutcome, UploadRequest};
use vrelay_source::{SourceFetcher, SourceStream};
use vrelay_youtube::VideoPlatform;

use crate::config::RelayConfig;
use crate::error::{RelayResult, ThumbnailError};
use crate::logging::JobLogger;
use crate::metrics;
use crate::notifier::Notifier;
use crate::retry::{retry_async_if, RetryResult};

/// Pipeline states, in the order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pending,
    Fetching,
    Uploading,
    ThumbnailPending,
    ThumbnailDone,
    ThumbnailFailed,
    Notifying,
    Terminal,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Uploading => "uploading",
            PipelineStage::ThumbnailPending => "thumbnail_pending",
            PipelineStage::ThumbnailDone => "thumbnail_done",
            PipelineStage::ThumbnailFailed => "thumbnail_failed",
            PipelineStage::Notifying => "notifying",
            PipelineStage::Terminal => "terminal",
        }
    }
}

/// What happened to the optional thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThumbnailStatus {
    /// No thumbnail requested, or the upload itself failed.
    Skipped,
    Attached { attempts: u32 },
    Failed { reason: String, attempts: u32 },
}

/// What happened to the outcome notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    NotConfigured,
    Delivered,
    Failed { reason: String },
}

/// Summary of one finished pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub job_id: JobId,
    pub outcome: UploadOutcome,
    pub thumbnail: ThumbnailStatus,
    pub notification: NotificationStatus,
    pub stages: Vec<PipelineStage>,
}

impl UploadReport {
    /// Report for a run whose task died before reaching a terminal state.
    pub fn aborted(
        job_id: JobId,
        outcome: UploadOutcome,
        notification: NotificationStatus,
    ) -> Self {
        Self {
            job_id,
            outcome,
            thumbnail: ThumbnailStatus::Skipped,
            notification,
            stages: vec![PipelineStage::Notifying, PipelineStage::Terminal],
        }
    }

    /// True if the stage was visited during the run.
    pub fn visited(&self, stage: PipelineStage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Records stage transitions and mirrors them to the job log.
struct StageTracker {
    logger: JobLogger,
    stages: Vec<PipelineStage>,
}

impl StageTracker {
    fn new(logger: JobLogger) -> Self {
        Self {
            logger,
            stages: vec![PipelineStage::Pending],
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.logger.stage(stage.as_str());
        self.stages.push(stage);
    }
}

/// Drives fetch, upload, thumbnail and notification for one request.
///
/// Collaborators are injected so tests can substitute them.
pub struct UploadPipeline {
    fetcher: Arc<dyn SourceFetcher>,
    platform: Arc<dyn VideoPlatform>,
    notifier: Option<Arc<dyn Notifier>>,
    config: RelayConfig,
}

impl UploadPipeline {
    /// Create a new pipeline. A `None` notifier disables notification.
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        platform: Arc<dyn VideoPlatform>,
        notifier: Option<Arc<dyn Notifier>>,
        config: RelayConfig,
    ) -> Self {
        Self {
            fetcher,
            platform,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run the request to a terminal state. Never fails: every error is
    /// folded into the returned report.
    pub async fn run(&self, job_id: JobId, request: UploadRequest) -> UploadReport {
        self.run_claimed(job_id, request, &AtomicBool::new(false)).await
    }

    /// Like `run`, but sets `notify_claim` as the run enters `Notifying`.
    ///
    /// A supervisor that sees the claim unset after the task died knows the
    /// outcome was never reported and may send it with `notify_aborted`.
    pub async fn run_claimed(
        &self,
        job_id: JobId,
        request: UploadRequest,
        notify_claim: &AtomicBool,
    ) -> UploadReport {
        let logger = JobLogger::new(&job_id, "video_upload");
        let mut tracker = StageTracker::new(logger.clone());
        let started = Instant::now();

        logger.started(&request.title);

        let (outcome, thumbnail) = match self.upload(&request, &mut tracker).await {
            Ok(video_id) => {
                let thumbnail = match &request.thumbnail {
                    Some(source) => self.attach_thumbnail(&video_id, source, &mut tracker).await,
                    None => ThumbnailStatus::Skipped,
                };

                metrics::record_upload_succeeded(started.elapsed().as_secs_f64());
                logger.succeeded(&video_id, started.elapsed());
                (UploadOutcome::success(video_id, request.title.clone()), thumbnail)
            }
            Err(e) => {
                metrics::record_upload_failed(e.stage());
                logger.failed(e.stage(), &e.to_string());
                (UploadOutcome::failure(e.user_message()), ThumbnailStatus::Skipped)
            }
        };

        tracker.enter(PipelineStage::Notifying);
        notify_claim.store(true, Ordering::SeqCst);
        let notification = self.notify(&outcome, &logger).await;
        tracker.enter(PipelineStage::Terminal);

        UploadReport {
            job_id,
            outcome,
            thumbnail,
            notification,
            stages: tracker.stages,
        }
    }

    /// Fetch the source and pipe it into the platform.
    async fn upload(&self, request: &UploadRequest, tracker: &mut StageTracker) -> RelayResult<String> {
        tracker.enter(PipelineStage::Fetching);
        let media = self.fetcher.open_stream(&request.source_url).await?;

        tracker.enter(PipelineStage::Uploading);
        let mut metadata = request.metadata(self.config.visibility);
        metadata.category_id = self.config.category_id.clone();

        // `media` is moved into the call and dropped on every path out of it.
        let video_id = self.platform.create_video(media, &metadata).await?;
        Ok(video_id)
    }

    /// Attach the thumbnail, waiting out the platform's propagation delay.
    ///
    /// Only "video not found" responses are retried; each attempt reopens
    /// the image source because a stream cannot be replayed.
    async fn attach_thumbnail(
        &self,
        video_id: &str,
        source: &ThumbnailSource,
        tracker: &mut StageTracker,
    ) -> ThumbnailStatus {
        tracker.enter(PipelineStage::ThumbnailPending);

        if !self.config.thumbnail_settle_delay.is_zero() {
            tokio::time::sleep(self.config.thumbnail_settle_delay).await;
        }

        let this = self;
        let result = retry_async_if(
            &self.config.thumbnail_retry(),
            move || async move { this.try_attach_thumbnail(video_id, source).await },
            ThumbnailError::is_not_found,
        )
        .await;

        match result {
            RetryResult::Success { attempts, .. } => {
                tracker.enter(PipelineStage::ThumbnailDone);
                ThumbnailStatus::Attached { attempts }
            }
            RetryResult::Failed { error, attempts } => {
                metrics::record_thumbnail_failed();
                tracker.logger.warning(
                    "thumbnail",
                    &format!("thumbnail not attached after {} attempt(s): {}", attempts, error),
                );
                tracker.enter(PipelineStage::ThumbnailFailed);
                ThumbnailStatus::Failed {
                    reason: error.to_string(),
                    attempts,
                }
            }
        }
    }

    async fn try_attach_thumbnail(
        &self,
        video_id: &str,
        source: &ThumbnailSource,
    ) -> Result<(), ThumbnailError> {
        let image = match source {
            ThumbnailSource::Url(url) => self.fetcher.open_stream(url).await?,
            ThumbnailSource::Binary { data, mime_type } => {
                SourceStream::from_bytes(data.clone(), mime_type.clone())
            }
        };

        self.platform.set_thumbnail(video_id, image).await?;
        Ok(())
    }

    /// Report the Failure of a run that died before reaching `Notifying`.
    pub async fn notify_aborted(&self, job_id: &JobId, outcome: &UploadOutcome) -> NotificationStatus {
        let logger = JobLogger::new(job_id, "video_upload");
        self.notify(outcome, &logger).await
    }

    /// Best-effort delivery; failures are logged and never escalated.
    async fn notify(&self, outcome: &UploadOutcome, logger: &JobLogger) -> NotificationStatus {
        let Some(notifier) = &self.notifier else {
            return NotificationStatus::NotConfigured;
        };

        match notifier.notify(&NotificationPayload::from(outcome)).await {
            Ok(()) => NotificationStatus::Delivered,
            Err(e) => {
                metrics::record_notification_failed();
                logger.warning("notify", &format!("notification not delivered: {}", e));
                NotificationStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use vrelay_models::VideoMetadata;
    use vrelay_source::{FetchError, FetchResult};
    use vrelay_youtube::{PlatformError, PlatformResult};

    use crate::error::{NotifyError, NotifyResult};

    /// Serves a fixed body for any URL except those containing "missing".
    struct FakeFetcher;

    #[async_trait]
    impl SourceFetcher for FakeFetcher {
        async fn open_stream(&self, url: &str) -> FetchResult<SourceStream> {
            if url.contains("missing") {
                return Err(FetchError::bad_status(404, url));
            }
            Ok(SourceStream::from_bytes(Bytes::from_static(b"media"), "video/mp4"))
        }
    }

    struct FakePlatform {
        create: Result<String, u16>,
        thumbnail_not_found_times: u32,
        thumbnail_status: Option<u16>,
        thumbnail_calls: AtomicU32,
        last_metadata: Mutex<Option<VideoMetadata>>,
    }

    impl FakePlatform {
        fn ok(id: &str) -> Self {
            Self {
                create: Ok(id.to_string()),
                thumbnail_not_found_times: 0,
                thumbnail_status: None,
                thumbnail_calls: AtomicU32::new(0),
                last_metadata: Mutex::new(None),
            }
        }

        fn rejecting(status: u16) -> Self {
            Self {
                create: Err(status),
                ..Self::ok("")
            }
        }
    }

    #[async_trait]
    impl VideoPlatform for FakePlatform {
        async fn create_video(
            &self,
            _media: SourceStream,
            metadata: &VideoMetadata,
        ) -> PlatformResult<String> {
            *self.last_metadata.lock().unwrap() = Some(metadata.clone());
            match &self.create {
                Ok(id) => Ok(id.clone()),
                Err(status) => Err(PlatformError::from_response(
                    *status,
                    r#"{"error":{"message":"quota exceeded"}}"#,
                )),
            }
        }

        async fn set_thumbnail(&self, _video_id: &str, _image: SourceStream) -> PlatformResult<()> {
            let call = self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.thumbnail_not_found_times {
                return Err(PlatformError::from_response(404, ""));
            }
            match self.thumbnail_status {
                Some(status) => Err(PlatformError::from_response(status, "forbidden")),
                None => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        payloads: Mutex<Vec<NotificationPayload>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, payload: &NotificationPayload) -> NotifyResult<()> {
            self.payloads.lock().unwrap().push(payload.clone());
            if self.fail {
                Err(NotifyError::Rejected(502))
            } else {
                Ok(())
            }
        }
    }

    fn fast_config() -> RelayConfig {
        RelayConfig {
            thumbnail_retry_base: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn pipeline(
        platform: Arc<FakePlatform>,
        notifier: Option<Arc<RecordingNotifier>>,
    ) -> UploadPipeline {
        UploadPipeline::new(
            Arc::new(FakeFetcher),
            platform,
            notifier.map(|n| n as Arc<dyn Notifier>),
            fast_config(),
        )
    }

    #[tokio::test]
    async fn test_success_without_webhook() {
        let platform = Arc::new(FakePlatform::ok("abc123"));
        let report = pipeline(platform, None)
            .run(JobId::new(), UploadRequest::new("https://valid/video.mp4", "T"))
            .await;

        assert_eq!(report.outcome, UploadOutcome::success("abc123", "T"));
        assert_eq!(report.notification, NotificationStatus::NotConfigured);
        assert_eq!(report.thumbnail, ThumbnailStatus::Skipped);
        assert_eq!(
            report.stages,
            vec![
                PipelineStage::Pending,
                PipelineStage::Fetching,
                PipelineStage::Uploading,
                PipelineStage::Notifying,
                PipelineStage::Terminal,
            ]
        );
    }

    #[tokio::test]
    async fn test_metadata_carries_configured_visibility() {
        let platform = Arc::new(FakePlatform::ok("abc123"));
        let mut config = fast_config();
        config.visibility = vrelay_models::Visibility::Unlisted;
        config.category_id = Some("22".into());

        let pipeline = UploadPipeline::new(Arc::new(FakeFetcher), platform.clone(), None, config);
        pipeline
            .run(
                JobId::new(),
                UploadRequest::new("https://valid/video.mp4", "T").with_tags(vec!["x".into()]),
            )
            .await;

        let meta = platform.last_metadata.lock().unwrap().clone().unwrap();
        assert_eq!(meta.visibility, vrelay_models::Visibility::Unlisted);
        assert_eq!(meta.category_id.as_deref(), Some("22"));
        assert_eq!(meta.tags, vec!["x"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_notifies_failure_once() {
        let platform = Arc::new(FakePlatform::ok("abc123"));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = pipeline(platform.clone(), Some(notifier.clone()))
            .run(JobId::new(), UploadRequest::new("https://valid/missing.mp4", "T"))
            .await;

        assert!(!report.outcome.is_success());
        assert!(!report.visited(PipelineStage::Uploading));
        assert!(platform.last_metadata.lock().unwrap().is_none());

        let payloads = notifier.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        match &payloads[0] {
            NotificationPayload::Failed { error } => assert!(error.contains("404")),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_platform_failure_has_reason() {
        let platform = Arc::new(FakePlatform::rejecting(403));
        let notifier = Arc::new(RecordingNotifier::default());

        let report = pipeline(platform, Some(notifier.clone()))
            .run(JobId::new(), UploadRequest::new("https://valid/video.mp4", "T"))
            .await;

        match &report.outcome {
            UploadOutcome::Failure { reason } => assert!(reason.contains("quota exceeded")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(report.notification, NotificationStatus::Delivered);
        assert_eq!(notifier.payloads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_thumbnail_failure_keeps_success() {
        let mut platform = FakePlatform::ok("abc123");
        platform.thumbnail_status = Some(403);
        let platform = Arc::new(platform);
        let notifier = Arc::new(RecordingNotifier::default());

        let request = UploadRequest::new("https://valid/video.mp4", "T")
            .with_thumbnail(Some(ThumbnailSource::Url("https://valid/thumb.jpg".into())));
        let report = pipeline(platform.clone(), Some(notifier.clone()))
            .run(JobId::new(), request)
            .await;

        assert_eq!(report.outcome, UploadOutcome::success("abc123", "T"));
        assert!(matches!(report.thumbnail, ThumbnailStatus::Failed { attempts: 1, .. }));
        assert!(report.visited(PipelineStage::ThumbnailFailed));
        // 403 is not a propagation delay, so no retry
        assert_eq!(platform.thumbnail_calls.load(Ordering::SeqCst), 1);

        let payloads = notifier.payloads.lock().unwrap();
        assert_eq!(
            payloads.as_slice(),
            &[NotificationPayload::Success {
                video_id: "abc123".into(),
                title: "T".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_thumbnail_retried_while_video_not_found() {
        let mut platform = FakePlatform::ok("abc123");
        platform.thumbnail_not_found_times = 2;
        let platform = Arc::new(platform);

        let request = UploadRequest::new("https://valid/video.mp4", "T").with_thumbnail(Some(
            ThumbnailSource::Binary {
                data: Bytes::from_static(b"png"),
                mime_type: "image/png".into(),
            },
        ));
        let report = pipeline(platform.clone(), None).run(JobId::new(), request).await;

        assert_eq!(report.thumbnail, ThumbnailStatus::Attached { attempts: 3 });
        assert!(report.visited(PipelineStage::ThumbnailDone));
        assert_eq!(platform.thumbnail_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_thumbnail_fetch_failure_is_not_fatal() {
        let platform = Arc::new(FakePlatform::ok("abc123"));

        let request = UploadRequest::new("https://valid/video.mp4", "T")
            .with_thumbnail(Some(ThumbnailSource::Url("https://valid/missing.jpg".into())));
        let report = pipeline(platform.clone(), None).run(JobId::new(), request).await;

        assert!(report.outcome.is_success());
        assert!(matches!(report.thumbnail, ThumbnailStatus::Failed { .. }));
        assert_eq!(platform.thumbnail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_notifier_failure_is_swallowed() {
        let platform = Arc::new(FakePlatform::ok("abc123"));
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });

        let report = pipeline(platform, Some(notifier.clone()))
            .run(JobId::new(), UploadRequest::new("https://valid/video.mp4", "T"))
            .await;

        assert!(report.outcome.is_success());
        assert!(matches!(report.notification, NotificationStatus::Failed { .. }));
        assert_eq!(notifier.payloads.lock().unwrap().len(), 1);
        assert_eq!(report.stages.last(), Some(&PipelineStage::Terminal));
    }
}
