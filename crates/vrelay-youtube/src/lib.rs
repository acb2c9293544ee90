//! YouTube Data API v3 client.
//!
//! This crate provides:
//! - Resumable, streamed video inserts
//! - Thumbnail attachment for already-created videos
//! - OAuth access token caching (refresh-token grant or static token)
//! - The `VideoPlatform` seam used by the upload pipeline

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use auth::{Credentials, TokenCache};
pub use client::{VideoPlatform, YouTubeClient};
pub use config::YouTubeConfig;
pub use error::{PlatformError, PlatformResult};
