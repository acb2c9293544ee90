//! Upload pipeline metrics.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const UPLOADS_STARTED_TOTAL: &str = "vrelay_uploads_started_total";
    pub const UPLOADS_SUCCEEDED_TOTAL: &str = "vrelay_uploads_succeeded_total";
    pub const UPLOADS_FAILED_TOTAL: &str = "vrelay_uploads_failed_total";
    pub const UPLOADS_IN_FLIGHT: &str = "vrelay_uploads_in_flight";
    pub const UPLOAD_DURATION_SECONDS: &str = "vrelay_upload_duration_seconds";
    pub const THUMBNAIL_FAILURES_TOTAL: &str = "vrelay_thumbnail_failures_total";
    pub const NOTIFICATIONS_FAILED_TOTAL: &str = "vrelay_notifications_failed_total";
}

pub fn record_upload_started() {
    counter!(names::UPLOADS_STARTED_TOTAL).increment(1);
    gauge!(names::UPLOADS_IN_FLIGHT).increment(1.0);
}

/// Paired with `record_upload_started`; runs from a scope guard.
pub fn record_upload_finished() {
    gauge!(names::UPLOADS_IN_FLIGHT).decrement(1.0);
}

pub fn record_upload_succeeded(duration_secs: f64) {
    counter!(names::UPLOADS_SUCCEEDED_TOTAL).increment(1);
    histogram!(names::UPLOAD_DURATION_SECONDS).record(duration_secs);
}

pub fn record_upload_failed(stage: &'static str) {
    counter!(names::UPLOADS_FAILED_TOTAL, "stage" => stage).increment(1);
}

pub fn record_thumbnail_failed() {
    counter!(names::THUMBNAIL_FAILURES_TOTAL).increment(1);
}

pub fn record_notification_failed() {
    counter!(names::NOTIFICATIONS_FAILED_TOTAL).increment(1);
}
