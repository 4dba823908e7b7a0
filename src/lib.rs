//! Canje Backend Library
//!
//! Exposes the service modules for the binary and the integration tests.

pub mod api;
pub mod app;
pub mod auth;
pub mod mail;
pub mod middleware;
pub mod store;

pub use app::build_app;
