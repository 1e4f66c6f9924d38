//! Request identification for logs.
//!
//! Every inbound request gets a UUID v4 carried on its tracing span. The ID
//! is not added to the request itself, so the target never sees it.

use axum::http::Request;
use tracing::Span;
use uuid::Uuid;

/// Identifier of one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Span for the HTTP trace layer.
pub fn make_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %RequestId::new(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
