//! Health check handlers.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

/// Static liveness body served at `/`.
pub const ROOT_BODY: &str = "Upload worker running";

/// Plain-text liveness probe.
pub async fn root() -> &'static str {
    ROOT_BODY
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
