//! cors-proxy
//!
//! ```text
//!   browser page (allowed origin)
//!        │  GET /?target=https://api.example.com/data
//!        │  Origin: http://localhost:3000
//!        ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ cors-proxy                                   │
//!   │   origin check → target → CORS headers       │
//!   │   OPTIONS: answer preflight here             │
//!   │   otherwise: forward, relay streamed body    │
//!   └──────────────────────────────────────────────┘
//!        │
//!        ▼
//!   target server
//! ```

use clap::Parser;

use cors_proxy::config::{finalize_config, load_config, CliArgs, ProxyConfig};
use cors_proxy::lifecycle::{shutdown_on_signal, Shutdown};
use cors_proxy::net;
use cors_proxy::observability::init_logging;
use cors_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let file_config = match &args.config_path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    let config = finalize_config(args.apply(file_config))?;

    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cors-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        allowed_origin = %config.cors.allowed_origin,
        allow_credentials = config.cors.allow_credentials,
        allowed_methods = %config.cors.allowed_methods,
        upstream_tls = ?config.upstream.tls,
        block_private_targets = config.upstream.block_private_targets,
        "Configuration loaded"
    );
    if !config.upstream.block_private_targets {
        tracing::warn!("Any target is forwarded, including private network addresses");
    }

    let listener = net::bind(&config.listener).await?;
    let tls = match &config.listener.tls {
        Some(tls) => Some(net::load_tls_config(tls).await?),
        None => None,
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    let server = HttpServer::new(config);
    match tls {
        Some(tls) => server.run_tls(listener, tls, server_shutdown).await?,
        None => server.run(listener, server_shutdown).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
