//! Command-line flags.
//!
//! Every flag is optional; a flag that is given overrides the matching
//! key of the config file (or the built-in default when there is no file).

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, ProxyConfig, TlsConfig, UpstreamTls};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cors-proxy", version, about = "Single-origin CORS proxy", long_about = None)]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<PathBuf>,

    /// host:port to listen on [default: localhost:4242]
    #[arg(long)]
    pub listen: Option<String>,

    /// The only allowed origin [default: http://localhost:3000]
    #[arg(long)]
    pub origin: Option<String>,

    /// Add the Access-Control-Allow-Credentials header
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub credentials: Option<bool>,

    /// Restrict to only a few methods (e.g. 'GET, POST')
    #[arg(long)]
    pub methods: Option<String>,

    /// PEM certificate; serves HTTPS together with --tls-key
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<String>,

    /// PEM private key; serves HTTPS together with --tls-cert
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<String>,

    /// Certificate verification for requests to the target
    #[arg(long, value_enum)]
    pub upstream_tls: Option<UpstreamTls>,

    /// Reject targets on loopback, private or link-local addresses
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub block_private_targets: Option<bool>,

    /// Seconds allowed to connect to the target
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Seconds allowed until the target sends response headers
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Default log level when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl CliArgs {
    /// Overlay the given flags on `config`.
    pub fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if let (Some(cert_path), Some(key_path)) = (self.tls_cert, self.tls_key) {
            config.listener.tls = Some(TlsConfig { cert_path, key_path });
        }
        if let Some(origin) = self.origin {
            config.cors.allowed_origin = origin;
        }
        if let Some(credentials) = self.credentials {
            config.cors.allow_credentials = credentials;
        }
        if let Some(methods) = self.methods {
            config.cors.allowed_methods = methods;
        }
        if let Some(tls) = self.upstream_tls {
            config.upstream.tls = tls;
        }
        if let Some(block) = self.block_private_targets {
            config.upstream.block_private_targets = block;
        }
        if let Some(secs) = self.connect_timeout {
            config.timeouts.connect_secs = secs;
        }
        if let Some(secs) = self.request_timeout {
            config.timeouts.request_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        config
    }
}
