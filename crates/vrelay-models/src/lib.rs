//! Shared data models for the video relay.
//!
//! This crate provides Serde-serializable types for:
//! - Upload requests and thumbnail sources
//! - Upload outcomes and webhook notification payloads
//! - Platform visibility levels
//! - Defensive tag parsing

pub mod job;
pub mod outcome;
pub mod request;
pub mod tags;
pub mod visibility;

// Re-export common types
pub use job::JobId;
pub use outcome::{NotificationPayload, UploadOutcome};
pub use request::{ThumbnailSource, UploadRequest, VideoMetadata};
pub use tags::{parse_tags, parse_tags_str};
pub use visibility::{Visibility, VisibilityParseError};
