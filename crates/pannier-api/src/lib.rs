//! # pannier-api
//!
//! HTTP composition layer for the pannier basket store.
//!
//! This crate provides the API surface for pannier, handling:
//!
//! - **Authentication**: Caller identification via JWT bearer tokens
//! - **Routing**: HTTP endpoint configuration
//! - **Service Wiring**: Composition of the basket service over object storage
//! - **Observability**: Metrics, tracing, and health checks
//!
//! ## Design Principles
//!
//! This crate is a **thin composition layer** with no domain policy.
//! All business logic lives in `pannier-basket`.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /ready                  - Readiness check
//! GET  /metrics                - Prometheus exposition
//! GET  /openapi.json           - OpenAPI spec
//! GET    /api/v1/basket        - Fetch the caller's basket
//! PUT    /api/v1/basket        - Replace the caller's basket
//! DELETE /api/v1/basket        - Delete the caller's basket
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pannier_api::server::Server;
//!
//! let server = Server::builder()
//!     .http_port(8080)
//!     .debug(true)
//!     .build();
//!
//! server.serve().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::Identity;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
