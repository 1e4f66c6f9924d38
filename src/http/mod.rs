//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, trace layer)
//!     → request.rs (request ID on the span)
//!     → handler.rs
//!         → cors.rs (origin, target, CORS headers, preflight)
//!         → forward.rs (outbound request, client, target policy)
//!         → response.rs (status, headers, streamed body)
//!     → Send to client
//! ```

pub mod cors;
pub mod error;
pub mod forward;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use error::{FetchError, ProxyError};
pub use handler::AppState;
pub use request::RequestId;
pub use server::HttpServer;
