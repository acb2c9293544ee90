//! Per-upload structured logging.
//!
//! Every event carries `job_id` so one upload can be followed across the
//! detached task, the retry loop and the notifier.

use std::time::Duration;

use tracing::{error, info, warn, Span};
use vrelay_models::JobId;

/// Logger bound to one upload.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    pub fn started(&self, title: &str) {
        info!(job_id = %self.job_id, operation = self.operation, title = %title, "Upload started");
    }

    pub fn stage(&self, stage: &str) {
        info!(job_id = %self.job_id, stage = stage, "Upload stage");
    }

    pub fn warning(&self, stage: &str, message: &str) {
        warn!(job_id = %self.job_id, stage = stage, "{}", message);
    }

    /// Terminal failure of the fetch or upload step.
    pub fn failed(&self, stage: &str, reason: &str) {
        error!(job_id = %self.job_id, stage = stage, reason = %reason, "Upload failed");
    }

    pub fn succeeded(&self, video_id: &str, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            video_id = %video_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Upload completed"
        );
    }

    /// Span wrapping the whole background task.
    pub fn span(&self) -> Span {
        tracing::info_span!("upload", job_id = %self.job_id, operation = self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_keeps_job_context() {
        let job_id = JobId::from_string("job-1");
        let logger = JobLogger::new(&job_id, "video_upload");

        assert_eq!(logger.job_id(), "job-1");
        assert_eq!(logger.operation(), "video_upload");
    }
}
