//! HTTP API layer for civic-report-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: report lifecycle, internal comments, messages, notifications
//! - **Extractors**: authentication
//! - **Middleware**: bearer-token resolution, application state
//!
//! Built on Axum with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;

pub use endpoints::router;
