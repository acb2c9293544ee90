//! Axum HTTP front door for the video relay.
//!
//! This crate provides:
//! - `POST /upload` accepting JSON or multipart bodies
//! - Immediate acknowledgment with background execution
//! - Health probes, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
