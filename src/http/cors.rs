//! CORS decisions for a single request.
//!
//! # Responsibilities
//! - Validate the `Origin` header against the configured origin
//! - Extract the `target` query parameter
//! - Build the CORS response headers
//! - Answer preflight requests by echoing `Access-Control-Request-*` headers
//!
//! # Design Decisions
//! - Origin comparison is byte-exact: no wildcard, no normalization
//! - The inbound `Origin` value is echoed, not the configured literal

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ORIGIN,
    },
    HeaderMap, HeaderName, HeaderValue,
};

use crate::config::CorsConfig;
use crate::http::error::ProxyError;

/// Query parameter naming the URL to forward to.
pub const TARGET_PARAM: &str = "target";

/// Check the first `Origin` header against the allowed origin.
///
/// A missing header counts as the empty string. Returns the inbound value to echo.
pub fn check_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<HeaderValue, ProxyError> {
    let origin = headers
        .get(ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));

    if origin.as_bytes() == allowed_origin.as_bytes() {
        Ok(origin)
    } else {
        Err(ProxyError::InvalidOrigin(
            String::from_utf8_lossy(origin.as_bytes()).into_owned(),
        ))
    }
}

/// Extract the single `target` value from a raw query string.
pub fn extract_target(query: Option<&str>) -> Result<String, ProxyError> {
    let mut targets = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned());

    match (targets.next(), targets.next()) {
        (Some(target), None) => Ok(target),
        (None, _) => Err(ProxyError::BadTarget("missing target parameter".into())),
        (Some(_), Some(_)) => Err(ProxyError::BadTarget("more than one target parameter".into())),
    }
}

/// Headers set on every accepted response, before anything else.
pub fn cors_response_headers(config: &CorsConfig, origin: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.append(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());

    if config.allow_credentials {
        headers.append(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    }

    match HeaderValue::from_str(&config.allowed_methods) {
        Ok(methods) => {
            headers.append(ACCESS_CONTROL_ALLOW_METHODS, methods);
        }
        Err(e) => {
            tracing::warn!(methods = %config.allowed_methods, error = %e, "Allowed methods are not a valid header value");
        }
    }

    headers
}

/// Map `Access-Control-Request-X` to `Access-Control-Allow-X`.
///
/// Returns `None` for headers that are not preflight request headers.
pub fn preflight_response_name(name: &HeaderName) -> Option<HeaderName> {
    const PREFIX: &str = "access-control-";
    let name = name.as_str();
    let at = name.find("access-control-request")? + PREFIX.len();
    let rewritten = format!("{}allow{}", &name[..at], &name[at + "request".len()..]);
    HeaderName::from_bytes(rewritten.as_bytes()).ok()
}

/// Copy every value of every preflight request header onto `response`.
pub fn append_preflight_headers(request: &HeaderMap, response: &mut HeaderMap) {
    for (name, value) in request {
        if let Some(allow_name) = preflight_response_name(name) {
            response.append(allow_name, value.clone());
        }
    }
}
