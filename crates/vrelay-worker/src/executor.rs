//! Detached upload execution.
//!
//! Each accepted request runs on its own Tokio task, decoupled from the
//! HTTP response. A supervising task joins the pipeline so that a panic in
//! one upload is logged and contained instead of silently vanishing, and
//! still produces the single outcome notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, Instrument};

use vrelay_models::{JobId, UploadOutcome, UploadRequest};

use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::{NotificationStatus, UploadPipeline, UploadReport};

/// Spawns pipeline runs in the background.
#[derive(Clone)]
pub struct UploadExecutor {
    pipeline: Arc<UploadPipeline>,
}

impl UploadExecutor {
    pub fn new(pipeline: Arc<UploadPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.pipeline
    }

    /// Start an upload and return immediately.
    ///
    /// The returned handle resolves once the run reaches a terminal state.
    /// Callers that only need fire-and-forget semantics may drop it.
    pub fn submit(&self, request: UploadRequest) -> (JobId, JoinHandle<UploadReport>) {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "video_upload");
        let span = logger.span();

        metrics::record_upload_started();

        let claim = Arc::new(AtomicBool::new(false));

        let pipeline = Arc::clone(&self.pipeline);
        let run_id = job_id.clone();
        let run_claim = Arc::clone(&claim);
        let inner = tokio::spawn(
            async move { pipeline.run_claimed(run_id, request, &run_claim).await }
                .instrument(span.clone()),
        );

        let pipeline = Arc::clone(&self.pipeline);
        let report_id = job_id.clone();
        let handle = tokio::spawn(
            async move {
                let _in_flight = scopeguard::guard((), |_| metrics::record_upload_finished());

                let e = match inner.await {
                    Ok(report) => return report,
                    Err(e) => e,
                };

                let reason = if e.is_panic() {
                    "Upload task panicked"
                } else {
                    "Upload task cancelled"
                };
                error!(job_id = %report_id, "{}: {}", reason, e);
                metrics::record_upload_failed("aborted");

                let outcome = UploadOutcome::failure(reason);
                // A set claim means the notifier itself was running; never call it twice.
                let notification = if claim.load(Ordering::SeqCst) {
                    NotificationStatus::Failed {
                        reason: reason.to_string(),
                    }
                } else {
                    pipeline.notify_aborted(&report_id, &outcome).await
                };

                UploadReport::aborted(report_id, outcome, notification)
            }
            .instrument(span),
        );

        (job_id, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use vrelay_models::{NotificationPayload, VideoMetadata};
    use vrelay_source::{FetchResult, SourceFetcher, SourceStream};
    use vrelay_youtube::{PlatformResult, VideoPlatform};

    use crate::config::RelayConfig;
    use crate::error::{NotifyError, NotifyResult};
    use crate::notifier::Notifier;
    use crate::pipeline::PipelineStage;

    struct StaticFetcher;

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        async fn open_stream(&self, _url: &str) -> FetchResult<SourceStream> {
            Ok(SourceStream::from_bytes(Bytes::from_static(b"media"), "video/mp4"))
        }
    }

    struct Platform {
        panic_on_create: bool,
    }

    #[async_trait]
    impl VideoPlatform for Platform {
        async fn create_video(
            &self,
            _media: SourceStream,
            _metadata: &VideoMetadata,
        ) -> PlatformResult<String> {
            if self.panic_on_create {
                panic!("platform client bug");
            }
            Ok("abc123".to_string())
        }

        async fn set_thumbnail(&self, _video_id: &str, _image: SourceStream) -> PlatformResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        payloads: Mutex<Vec<NotificationPayload>>,
        panic_on_notify: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, payload: &NotificationPayload) -> NotifyResult<()> {
            self.payloads.lock().unwrap().push(payload.clone());
            if self.panic_on_notify {
                panic!("notifier bug");
            }
            Ok::<_, NotifyError>(())
        }
    }

    fn executor_with(
        panic_on_create: bool,
        notifier: Option<Arc<RecordingNotifier>>,
    ) -> UploadExecutor {
        let pipeline = UploadPipeline::new(
            Arc::new(StaticFetcher),
            Arc::new(Platform { panic_on_create }),
            notifier.map(|n| n as Arc<dyn Notifier>),
            RelayConfig::default(),
        );
        UploadExecutor::new(Arc::new(pipeline))
    }

    fn executor(panic_on_create: bool) -> UploadExecutor {
        executor_with(panic_on_create, None)
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let (job_id, handle) = executor(false).submit(UploadRequest::new("https://valid/v.mp4", "T"));

        let report = handle.await.unwrap();
        assert_eq!(report.job_id, job_id);
        assert_eq!(report.outcome, UploadOutcome::success("abc123", "T"));
    }

    #[tokio::test]
    async fn test_submit_gives_distinct_job_ids() {
        let executor = executor(false);
        let (a, ha) = executor.submit(UploadRequest::new("https://valid/a.mp4", "A"));
        let (b, hb) = executor.submit(UploadRequest::new("https://valid/b.mp4", "B"));

        assert_ne!(a, b);
        assert!(ha.await.unwrap().outcome.is_success());
        assert!(hb.await.unwrap().outcome.is_success());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (job_id, handle) = executor(true).submit(UploadRequest::new("https://valid/v.mp4", "T"));

        let report = handle.await.unwrap();
        assert_eq!(report.job_id, job_id);
        assert_eq!(report.outcome, UploadOutcome::failure("Upload task panicked"));
        assert_eq!(report.notification, NotificationStatus::NotConfigured);
        assert_eq!(report.stages.last(), Some(&PipelineStage::Terminal));
    }

    #[tokio::test]
    async fn test_panic_still_notifies_failure_once() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (_, handle) = executor_with(true, Some(notifier.clone()))
            .submit(UploadRequest::new("https://valid/v.mp4", "T"));

        let report = handle.await.unwrap();
        assert_eq!(report.notification, NotificationStatus::Delivered);

        let payloads = notifier.payloads.lock().unwrap();
        assert_eq!(
            payloads.as_slice(),
            &[NotificationPayload::Failed {
                error: "Upload task panicked".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_panicking_notifier_is_not_called_twice() {
        let notifier = Arc::new(RecordingNotifier {
            panic_on_notify: true,
            ..Default::default()
        });
        let (_, handle) = executor_with(false, Some(notifier.clone()))
            .submit(UploadRequest::new("https://valid/v.mp4", "T"));

        let report = handle.await.unwrap();
        assert!(!report.outcome.is_success());
        assert!(matches!(report.notification, NotificationStatus::Failed { .. }));
        assert_eq!(notifier.payloads.lock().unwrap().len(), 1);
    }
}
