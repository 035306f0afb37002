//! `OpenAPI` (3.1) specification generation for `pannier-api`.
//!
//! The generated spec is served at `/openapi.json` and is used to generate
//! external clients and to detect breaking API changes in CI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// `OpenAPI` documentation for the pannier REST API (`/api/v1/*`).
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pannier API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Per-customer basket REST API"
    ),
    paths(
        crate::routes::basket::get_basket,
        crate::routes::basket::update_basket,
        crate::routes::basket::delete_basket,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::routes::basket::BasketItemDto,
            crate::routes::basket::UpdateBasketRequest,
            crate::routes::basket::BasketResponse,
        )
    ),
    tags(
        (name = "basket", description = "Basket operations"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Returns the generated `OpenAPI` spec.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Returns the generated `OpenAPI` spec serialized as pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen).
pub fn openapi_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&openapi())
}
