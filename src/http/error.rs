//! Per-request failure kinds and how each one is rendered.

use std::time::Duration;

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Boxed error used where the concrete source type does not matter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every way handling a single request can end early.
///
/// All of them are terminal for the request; none are retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `Origin` header does not equal the configured origin.
    #[error("invalid origin tried to use this service: {0}")]
    InvalidOrigin(String),

    /// The `target` query parameter is missing, repeated or not allowed.
    #[error("the target is wrong: {0}")]
    BadTarget(String),

    /// The downstream request could not be built or did not produce a response.
    #[error("could not fetch the target: {0}")]
    FetchingTarget(#[source] FetchError),

    /// The body relay broke after status and headers were committed.
    #[error("could not send response: already sent {sent} bytes: {source}")]
    SendingResponse {
        sent: u64,
        #[source]
        source: BoxError,
    },
}

/// Why the downstream call failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target is not a parseable absolute URL.
    #[error("invalid target url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client for this request could not be created.
    #[error("could not create client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network, DNS, TLS or protocol failure while waiting for the response.
    #[error("{}", error_chain(.0))]
    Network(reqwest::Error),

    /// No response headers arrived in time.
    #[error("no response from target within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Only failures of the network call itself are shown to the caller;
    /// construction failures answer with an empty body.
    pub fn is_construction_failure(&self) -> bool {
        matches!(self, FetchError::InvalidUrl(_) | FetchError::Client(_))
    }
}

impl ProxyError {
    /// Status code sent for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidOrigin(_) => StatusCode::FORBIDDEN,
            ProxyError::BadTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::FetchingTarget(_) | ProxyError::SendingResponse { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::FetchingTarget(err) if !err.is_construction_failure() => {
                Body::from(err.to_string())
            }
            _ => Body::empty(),
        };
        (self.status(), body).into_response()
    }
}

/// Render an error followed by each of its sources, separated by `": "`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // Some wrappers repeat their source in their own message.
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
