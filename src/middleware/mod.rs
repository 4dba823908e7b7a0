//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

pub mod logging;

pub use logging::request_logging;
