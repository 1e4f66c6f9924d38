//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listen address
//!     → listener.rs (resolve and bind)
//!     → tls.rs (optional certificate loading)
//!     → Hand off to HTTP layer (plain or TLS server)
//! ```
//!
//! # Design Decisions
//! - A bind failure is fatal; the process exits
//! - TLS is optional and decided once per listener, so every request on a
//!   listener shares the same `inbound_tls` flag

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::load_tls_config;
