//! HTTP server for the browser extension.
//!
//! This module provides:
//! - The axum router and handlers (`routes`)
//! - Configuration and secrets loading (`config`)
//!
//! Only compiled with the `server` feature.

pub mod config;
pub mod routes;

pub use routes::{AppState, ServiceInfo, router};
