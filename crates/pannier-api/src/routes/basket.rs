//! Basket API routes.
//!
//! The basket is singular per caller: the owner always comes from the
//! resolved identity, never from the path or body.
//!
//! ## Routes
//!
//! - `GET    /basket` - Fetch the caller's basket
//! - `PUT    /basket` - Replace the caller's basket wholesale
//! - `DELETE /basket` - Delete the caller's basket

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use pannier_basket::{BasketItems, BasketLine, ProductId};

use crate::context::Identity;
use crate::error::{ApiError, ApiErrorBody};
use crate::server::AppState;

/// One product line in a basket.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BasketItemDto {
    /// Product identifier.
    pub product_id: u64,
    /// Number of units (at least 1).
    pub quantity: u32,
}

/// Request to replace the caller's basket.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBasketRequest {
    /// The full set of basket lines; replaces whatever was stored.
    pub items: Vec<BasketItemDto>,
}

/// Basket response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BasketResponse {
    /// Basket lines, ordered by product ID.
    pub items: Vec<BasketItemDto>,
}

/// Creates basket routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/basket",
        get(get_basket).put(update_basket).delete(delete_basket),
    )
}

/// Fetch the caller's basket.
///
/// GET /api/v1/basket
#[utoipa::path(
    get,
    path = "/api/v1/basket",
    tag = "basket",
    responses(
        (status = 200, description = "Basket fetched (empty for anonymous callers)", body = BasketResponse),
        (status = 500, description = "Internal error", body = ApiErrorBody),
        (status = 503, description = "Basket store unavailable", body = ApiErrorBody),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub(crate) async fn get_basket(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(request_id = %identity.request_id, "Fetching basket");

    let items = state
        .basket_service()
        .get_basket(identity.owner.as_ref())
        .await
        .map_err(|e| ApiError::from(e).with_request_id(identity.request_id.clone()))?;

    Ok(Json(BasketResponse {
        items: items_to_dtos(&items),
    }))
}

/// Replace the caller's basket wholesale.
///
/// PUT /api/v1/basket
#[utoipa::path(
    put,
    path = "/api/v1/basket",
    tag = "basket",
    request_body = UpdateBasketRequest,
    responses(
        (status = 200, description = "Basket replaced", body = BasketResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 401, description = "Unauthenticated", body = ApiErrorBody),
        (status = 404, description = "Write not applied", body = ApiErrorBody),
        (status = 500, description = "Internal error", body = ApiErrorBody),
        (status = 503, description = "Basket store unavailable", body = ApiErrorBody),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub(crate) async fn update_basket(
    identity: Identity,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateBasketRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        request_id = %identity.request_id,
        lines = req.items.len(),
        "Replacing basket"
    );

    let lines = lines_from_request(req);
    let update = state
        .basket_service()
        .update_basket(identity.owner.as_ref(), &lines)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(identity.request_id.clone()))?;

    Ok(Json(BasketResponse {
        items: items_to_dtos(update.snapshot.items()),
    }))
}

/// Delete the caller's basket.
///
/// DELETE /api/v1/basket
#[utoipa::path(
    delete,
    path = "/api/v1/basket",
    tag = "basket",
    responses(
        (status = 204, description = "Basket deleted"),
        (status = 401, description = "Unauthenticated", body = ApiErrorBody),
        (status = 500, description = "Internal error", body = ApiErrorBody),
        (status = 503, description = "Basket store unavailable", body = ApiErrorBody),
    ),
    security(
        ("bearerAuth" = [])
    )
)]
pub(crate) async fn delete_basket(
    identity: Identity,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(request_id = %identity.request_id, "Deleting basket");

    state
        .basket_service()
        .delete_basket(identity.owner.as_ref())
        .await
        .map_err(|e| ApiError::from(e).with_request_id(identity.request_id.clone()))?;

    Ok(StatusCode::NO_CONTENT)
}

fn items_to_dtos(items: &BasketItems) -> Vec<BasketItemDto> {
    items
        .iter()
        .map(|(product_id, quantity)| BasketItemDto {
            product_id: product_id.as_u64(),
            quantity: *quantity,
        })
        .collect()
}

fn lines_from_request(req: UpdateBasketRequest) -> Vec<BasketLine> {
    req.items
        .into_iter()
        .map(|item| BasketLine::new(ProductId::new(item.product_id), item.quantity))
        .collect()
}
