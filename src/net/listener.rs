//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured `host:port` (names such as `localhost` allowed)
//! - Treat an empty host (`:4242`) as every interface
//! - Bind the first address that accepts
//! - Report bind failures as fatal startup errors

use std::borrow::Cow;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = socket_address(&config.bind_address);
    let listener = TcpListener::bind(&*address)
        .await
        .map_err(|source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    let local_addr = local_addr(&listener, &config.bind_address)?;
    tracing::info!(
        address = %local_addr,
        tls = config.tls.is_some(),
        "Listener bound"
    );

    Ok(listener)
}

/// Address handed to the socket layer. `:port` listens on all interfaces.
fn socket_address(bind_address: &str) -> Cow<'_, str> {
    if bind_address.starts_with(':') {
        Cow::Owned(format!("0.0.0.0{bind_address}"))
    } else {
        Cow::Borrowed(bind_address)
    }
}

fn local_addr(listener: &TcpListener, address: &str) -> Result<SocketAddr, ListenerError> {
    listener.local_addr().map_err(|source| ListenerError::Bind {
        address: address.to_string(),
        source,
    })
}
