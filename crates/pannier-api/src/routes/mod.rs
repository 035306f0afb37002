//! HTTP route handlers.

pub mod basket;

use std::sync::Arc;

use axum::Router;

use crate::server::AppState;

/// `/api/v1` routes (identity-resolved).
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    basket::routes()
}
