//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router sending every method and path to the proxy handler
//! - Wire up the trace layer (one span per request, with request ID)
//! - Serve plain HTTP or TLS on an already bound listener
//! - Stop accepting on shutdown and let in-flight requests finish

use std::sync::Arc;

use axum::{body::Body, routing::any, Router};
use axum_server::tls_rustls::{from_tcp_rustls, RustlsConfig};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::handler::{proxy_handler, AppState};
use crate::http::request::make_span;
use crate::lifecycle::shutdown;

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Build the Axum router for a listener.
    pub fn router(&self, inbound_tls: bool) -> Router {
        let state = AppState {
            config: Arc::clone(&self.config),
            inbound_tls,
        };

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http().make_span_with(make_span::<Body>)),
            )
    }

    /// Serve plain HTTP until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router(false))
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS with `tls` until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        if self.config.upstream.tls.skips_verification(true) {
            tracing::warn!(
                policy = ?self.config.upstream.tls,
                "Target certificates will not be verified for requests arriving over TLS"
            );
        }

        let listener = listener.into_std()?;
        listener.set_nonblocking(true)?;

        let handle = axum_server::Handle::new();
        let stopper = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            stopper.graceful_shutdown(None);
        });

        from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(self.router(true).into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
