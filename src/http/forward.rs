//! Forwarding to the target.
//!
//! # Responsibilities
//! - Decide whether a target address may be contacted at all
//! - Build the outbound request: same method, inbound headers, streamed body
//! - Create a client for the call with the right TLS verification and timeouts
//!
//! # Design Decisions
//! - A fresh client per call; the only pooling is inside that client
//! - The body is never buffered
//! - Connect and response-header waits are bounded; the body stream is not

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
        },
        HeaderMap, HeaderName, Method,
    },
};
use reqwest::redirect;
use url::{Host, Url};

use crate::config::TimeoutConfig;
use crate::http::error::{FetchError, ProxyError};

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Headers that describe a single connection and are never copied across the proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == CONNECTION
        || *name == TE
        || *name == TRAILER
        || *name == TRANSFER_ENCODING
        || *name == UPGRADE
        || name.as_str() == "keep-alive"
        || name.as_str() == "proxy-connection"
}

/// Whether an inbound request header is copied to the target.
///
/// `Host` is derived from the target URL by the client.
pub fn is_forwarded_request_header(name: &HeaderName) -> bool {
    *name != ACCESS_CONTROL_ALLOW_ORIGIN
        && *name != ACCESS_CONTROL_ALLOW_CREDENTIALS
        && *name != ACCESS_CONTROL_ALLOW_METHODS
        && *name != HOST
        && !is_hop_by_hop(name)
}

/// Copy the inbound headers that may be sent to the target.
pub fn forwarded_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_forwarded_request_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Which targets may be contacted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetPolicy {
    /// Refuse loopback, private, link-local and unspecified addresses.
    pub block_private: bool,
}

impl TargetPolicy {
    /// Reject a target the policy does not allow.
    ///
    /// Targets that do not parse pass here; they fail later when the
    /// outbound request is built.
    pub fn check(&self, target: &str) -> Result<(), ProxyError> {
        if !self.block_private {
            return Ok(());
        }
        match Url::parse(target) {
            Ok(url) if !self.allows(&url) => Err(ProxyError::BadTarget(format!(
                "target host {} is not allowed",
                url.host_str().unwrap_or_default()
            ))),
            _ => Ok(()),
        }
    }

    /// Whether `url` may be contacted. Only literal addresses and `localhost`
    /// names are recognised; names are not resolved.
    pub fn allows(&self, url: &Url) -> bool {
        if !self.block_private {
            return true;
        }
        match url.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.').to_ascii_lowercase();
                domain != "localhost" && !domain.ends_with(".localhost")
            }
            Some(Host::Ipv4(ip)) => !is_private_v4(ip),
            Some(Host::Ipv6(ip)) => !is_private_v6(ip),
            None => true,
        }
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // 100.64.0.0/10, carrier-grade NAT
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

/// Build the request sent to `target`, consuming the inbound parts.
pub fn build_outbound_request(
    method: Method,
    target: &str,
    headers: &HeaderMap,
    body: Body,
) -> Result<reqwest::Request, FetchError> {
    let url = Url::parse(target)?;

    let mut request = reqwest::Request::new(method, url);
    *request.headers_mut() = forwarded_request_headers(headers);

    if body.size_hint().exact() != Some(0) {
        *request.body_mut() = Some(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    Ok(request)
}

/// Create the client used for exactly one downstream call.
pub fn build_client(
    skip_tls_verification: bool,
    timeouts: &TimeoutConfig,
    policy: TargetPolicy,
) -> Result<reqwest::Client, FetchError> {
    let redirects = redirect::Policy::custom(move |attempt| {
        if !policy.allows(attempt.url()) {
            // Hand the redirect itself back to the caller.
            attempt.stop()
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error(format!("stopped after {MAX_REDIRECTS} redirects"))
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .danger_accept_invalid_certs(skip_tls_verification)
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .redirect(redirects)
        .no_proxy()
        .build()
        .map_err(FetchError::Client)
}

/// Execute `request`, waiting at most `timeouts.request_secs` for the response headers.
pub async fn send(
    client: &reqwest::Client,
    request: reqwest::Request,
    timeouts: &TimeoutConfig,
) -> Result<reqwest::Response, FetchError> {
    let limit = Duration::from_secs(timeouts.request_secs);
    match tokio::time::timeout(limit, client.execute(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(FetchError::Network(e)),
        Err(_) => Err(FetchError::Timeout(limit)),
    }
}
