//! Single-origin CORS proxy.
//!
//! A browser page served from one origin calls
//! `http://<proxy>/?target=<url>`; the proxy checks the `Origin` header,
//! answers CORS preflight itself and otherwise forwards the request to
//! `<url>`, relaying the response with CORS headers added.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
