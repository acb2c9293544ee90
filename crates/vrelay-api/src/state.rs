//! Application state.

use std::sync::Arc;

use vrelay_worker::UploadExecutor;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub executor: Arc<UploadExecutor>,
}

impl AppState {
    /// Create new application state around an already-built executor.
    pub fn new(config: ApiConfig, executor: UploadExecutor) -> Self {
        Self {
            config,
            executor: Arc::new(executor),
        }
    }
}
