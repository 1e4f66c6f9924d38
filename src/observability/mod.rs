//! Observability subsystem.
//!
//! Logging is the only sink: every request gets a span from the HTTP trace
//! layer (with a request ID), and the handler emits structured events for
//! each terminal state of the request.

pub mod logging;

pub use logging::init_logging;
