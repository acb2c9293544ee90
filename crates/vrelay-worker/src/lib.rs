//! Background upload pipeline.
//!
//! This crate provides:
//! - The per-request pipeline (fetch, upload, thumbnail, notify)
//! - A detached executor with its own error boundary
//! - Best-effort webhook notification
//! - Bounded retry for the thumbnail settle window
//! - Structured job logging and upload metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod retry;

pub use config::RelayConfig;
pub use error::{NotifyError, NotifyResult, RelayError, RelayResult, ThumbnailError};
pub use executor::UploadExecutor;
pub use logging::JobLogger;
pub use notifier::{Notifier, WebhookNotifier};
pub use pipeline::{NotificationStatus, PipelineStage, ThumbnailStatus, UploadPipeline, UploadReport};
pub use retry::{RetryConfig, RetryResult};
