//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default value of `Access-Control-Allow-Methods`.
///
/// The duplicated `HEAD` is intentional: existing deployments send this exact string.
pub const DEFAULT_ALLOWED_METHODS: &str =
    "GET, PUT, POST, HEAD, TRACE, DELETE, PATCH, COPY, HEAD, LINK, OPTIONS";

/// Root configuration for the CORS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// CORS policy applied to every accepted request.
    pub cors: CorsConfig,

    /// Downstream (target) request behaviour.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address as `host:port` (e.g., "localhost:4242").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:4242".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    /// The only `Origin` header value accepted (exact match).
    pub allowed_origin: String,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Value of `Access-Control-Allow-Methods`, sent verbatim.
    pub allowed_methods: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:3000".to_string(),
            allow_credentials: false,
            allowed_methods: DEFAULT_ALLOWED_METHODS.to_string(),
        }
    }
}

/// Certificate verification policy for requests sent to the target.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamTls {
    /// Skip verification when the inbound connection was TLS, verify otherwise.
    #[default]
    Inherit,
    /// Always verify target certificates.
    Verify,
    /// Never verify target certificates.
    Skip,
}

impl UpstreamTls {
    /// Whether certificate verification is skipped for a request that arrived
    /// over TLS (`inbound_tls`) or plain HTTP.
    pub fn skips_verification(self, inbound_tls: bool) -> bool {
        match self {
            UpstreamTls::Inherit => inbound_tls,
            UpstreamTls::Verify => false,
            UpstreamTls::Skip => true,
        }
    }
}

/// Downstream request configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// TLS verification policy for targets.
    pub tls: UpstreamTls,

    /// Reject targets that name loopback, private or link-local addresses.
    pub block_private_targets: bool,
}

/// Timeout configuration for the downstream call.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until the target sends response headers, in seconds.
    /// The body stream is not bounded.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
