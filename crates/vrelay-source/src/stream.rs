//! Byte stream over remote (or in-memory) media.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::{FetchError, FetchResult};

/// A readable stream of media bytes plus the transport metadata needed to
/// forward it.
///
/// Dropping the stream releases the underlying connection, so every exit
/// path (including early errors downstream) closes it.
pub struct SourceStream {
    content_type: Option<String>,
    content_length: Option<u64>,
    inner: BoxStream<'static, FetchResult<Bytes>>,
}

impl SourceStream {
    pub fn new(
        inner: BoxStream<'static, FetchResult<Bytes>>,
        content_type: Option<String>,
        content_length: Option<u64>,
    ) -> Self {
        Self {
            content_type,
            content_length,
            inner,
        }
    }

    /// Wrap an in-memory payload (e.g. a binary thumbnail from a form field).
    pub fn from_bytes(data: Bytes, content_type: impl Into<String>) -> Self {
        let len = data.len() as u64;
        Self {
            content_type: Some(content_type.into()),
            content_length: Some(len),
            inner: stream::once(async move { Ok::<_, FetchError>(data) }).boxed(),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Convert into a streaming request body. Bytes are forwarded as they
    /// arrive; nothing is collected in memory.
    pub fn into_body(self) -> reqwest::Body {
        reqwest::Body::wrap_stream(self.inner)
    }
}

impl Stream for SourceStream {
    type Item = FetchResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for SourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
