//! Response relay back to the caller.
//!
//! By the time the body streams, status and headers are on the wire, so a
//! failure here can only be logged.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    http::HeaderMap,
    response::Response,
};
use futures_util::Stream;

use crate::http::error::{error_chain, BoxError, ProxyError};
use crate::http::forward::is_hop_by_hop;

type ChunkStream<E> = Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>;

/// How a relayed body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Streaming,
    Complete,
    Interrupted,
}

/// Body stream that counts relayed bytes and reports how the relay ended.
pub struct RelayBody<E> {
    inner: ChunkStream<E>,
    origin: String,
    target: String,
    expected: Option<u64>,
    sent: u64,
    state: RelayState,
}

impl<E> RelayBody<E> {
    pub fn new<S>(stream: S, origin: String, target: String, expected: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            origin,
            target,
            expected,
            sent: 0,
            state: RelayState::Streaming,
        }
    }

    /// Bytes handed to the server so far.
    fn sent(&self) -> u64 {
        self.sent
    }

    #[cfg(test)]
    fn state(&self) -> RelayState {
        self.state
    }

    fn complete(&mut self) {
        self.state = RelayState::Complete;
        tracing::info!(
            origin = %self.origin,
            target_url = %self.target,
            bytes = self.sent(),
            "Sent response"
        );
    }

    fn interrupted(&mut self, source: BoxError) {
        self.state = RelayState::Interrupted;
        let err = ProxyError::SendingResponse {
            sent: self.sent(),
            source,
        };
        tracing::warn!(origin = %self.origin, target_url = %self.target, "{}", err);
    }
}

impl<E> Stream for RelayBody<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.interrupted(error_chain(&e).into());
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if this.state == RelayState::Streaming {
                    this.complete();
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<E> Drop for RelayBody<E> {
    fn drop(&mut self) {
        if self.state != RelayState::Streaming {
            return;
        }
        // The server may stop polling once a known length has been written.
        if self.expected == Some(self.sent) {
            self.complete();
        } else {
            self.interrupted("caller went away before the body was relayed".into());
        }
    }
}

/// Build the caller's response from the target's.
///
/// `headers` already carries the CORS headers; target headers are appended after them.
pub fn relay_response(
    upstream: reqwest::Response,
    mut headers: HeaderMap,
    origin: String,
    target: String,
) -> Response {
    let status = upstream.status();
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let expected = upstream.content_length();
    let body = RelayBody::new(upstream.bytes_stream(), origin, target, expected);

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    type Chunk = Result<Bytes, std::io::Error>;

    fn chunks(parts: Vec<Chunk>) -> impl Stream<Item = Chunk> + Send + 'static {
        futures_util::stream::iter(parts)
    }

    fn ok(part: &'static str) -> Chunk {
        Ok(Bytes::from_static(part.as_bytes()))
    }

    #[tokio::test]
    async fn counts_relayed_bytes() {
        let mut body = RelayBody::new(chunks(vec![ok("hel"), ok("lo")]), "o".into(), "t".into(), Some(5));
        let mut collected = Vec::new();
        while let Some(chunk) = body.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"hello");
        assert_eq!(body.sent(), 5);
        assert_eq!(body.state(), RelayState::Complete);
    }

    #[tokio::test]
    async fn target_error_interrupts_the_relay() {
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let mut body = RelayBody::new(
            chunks(vec![ok("abc"), Err(reset), ok("never")]),
            "o".into(),
            "t".into(),
            Some(10),
        );

        assert_eq!(body.next().await.unwrap().unwrap().as_ref(), b"abc");
        let err = body.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
        assert_eq!(body.sent(), 3);
        assert_eq!(body.state(), RelayState::Interrupted);
    }

    #[tokio::test]
    async fn early_drop_is_not_completion() {
        let mut body = RelayBody::new(chunks(vec![ok("hel"), ok("lo")]), "o".into(), "t".into(), Some(5));
        let _ = body.next().await;
        assert_eq!(body.sent(), 3);
        assert_eq!(body.state(), RelayState::Streaming);
    }
}
