//! Streaming fetcher for remote source media.
//!
//! This crate provides:
//! - A `SourceFetcher` seam so the pipeline can be driven by fakes in tests
//! - An HTTP implementation that never buffers the whole payload
//! - `SourceStream`, a byte stream that can be piped into an outbound body

pub mod client;
pub mod error;
pub mod stream;

pub use client::{HttpSourceFetcher, SourceFetcher, SourceFetcherConfig};
pub use error::{FetchError, FetchResult};
pub use stream::SourceStream;
