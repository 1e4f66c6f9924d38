//! The proxy handler.
//!
//! One call per inbound request, strictly linear:
//!
//! ```text
//! origin check ──✗──▶ 403
//!     │
//! target extraction ──✗──▶ 400
//!     │
//! CORS headers
//!     │
//! OPTIONS? ──▶ 200 preflight (target never contacted)
//!     │
//! build request ──✗──▶ 500, empty
//!     │
//! call target ──✗──▶ 500, error text
//!     │
//! relay status, headers, streamed body
//! ```
//!
//! Nothing is retried. Only the call to the target suspends.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    response::{IntoResponse, Response},
};

use crate::config::ProxyConfig;
use crate::http::cors::{append_preflight_headers, check_origin, cors_response_headers, extract_target};
use crate::http::error::{FetchError, ProxyError};
use crate::http::forward::{build_client, build_outbound_request, send, TargetPolicy};
use crate::http::response::relay_response;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration shared by every request.
    pub config: Arc<ProxyConfig>,
    /// Whether requests on this listener arrive over TLS.
    pub inbound_tls: bool,
}

impl AppState {
    fn target_policy(&self) -> TargetPolicy {
        TargetPolicy {
            block_private: self.config.upstream.block_private_targets,
        }
    }

    /// Whether target certificates go unchecked for requests on this listener.
    fn skips_target_verification(&self) -> bool {
        self.config.upstream.tls.skips_verification(self.inbound_tls)
    }
}

/// Validate, answer preflight or forward, then relay.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let config = &state.config;

    let origin = match check_origin(request.headers(), &config.cors.allowed_origin) {
        Ok(origin) => origin,
        Err(err) => {
            tracing::warn!("{}", err);
            return err.into_response();
        }
    };

    let policy = state.target_policy();
    let target = match extract_target(request.uri().query())
        .and_then(|target| policy.check(&target).map(|()| target))
    {
        Ok(target) => target,
        Err(err) => {
            tracing::warn!("{}", err);
            return err.into_response();
        }
    };

    tracing::info!(
        origin = %config.cors.allowed_origin,
        target_url = %target,
        method = %request.method(),
        "Proxy request"
    );

    let mut headers = cors_response_headers(&config.cors, &origin);

    if request.method() == Method::OPTIONS {
        append_preflight_headers(request.headers(), &mut headers);
        tracing::debug!(target_url = %target, "Answered preflight");
        let mut response = Response::new(Body::empty());
        *response.headers_mut() = headers;
        return response;
    }

    let (parts, body) = request.into_parts();
    let outbound = match build_outbound_request(parts.method, &target, &parts.headers, body) {
        Ok(outbound) => outbound,
        Err(err) => return fetch_failed(err, &target, headers),
    };

    let client = match build_client(state.skips_target_verification(), &config.timeouts, policy) {
        Ok(client) => client,
        Err(err) => return fetch_failed(err, &target, headers),
    };

    let upstream = match send(&client, outbound, &config.timeouts).await {
        Ok(upstream) => upstream,
        Err(err) => return fetch_failed(err, &target, headers),
    };

    tracing::debug!(target_url = %target, status = %upstream.status(), "Target responded");
    relay_response(upstream, headers, config.cors.allowed_origin.clone(), target)
}

/// Render a failed downstream call, keeping the CORS headers so the browser
/// can read the error.
fn fetch_failed(err: FetchError, target: &str, cors_headers: HeaderMap) -> Response {
    let err = ProxyError::FetchingTarget(err);
    tracing::error!(target_url = %target, "{}", err);

    let mut response = err.into_response();
    for (name, value) in &cors_headers {
        response.headers_mut().append(name.clone(), value.clone());
    }
    response
}
