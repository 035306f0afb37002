//! API server implementation.
//!
//! Provides health, ready, metrics, and basket endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pannier_basket::{BasketService, BasketStore};
use pannier_core::{Error, MemoryBackend, Result, StorageBackend};

use crate::config::{Config, CorsConfig};
use crate::error::ApiError;

/// Sentinel key probed by the readiness endpoint.
///
/// A `HEAD` on a missing key is sufficient to validate credentials and
/// network path without listing the bucket.
const READY_CHECK_KEY: &str = "__pannier/ready-check";

// ============================================================================
// Health and Ready Responses
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Basket service over the configured storage backend.
    service: BasketService,
    /// Storage backend, kept for readiness probes.
    storage: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("storage", &"<StorageBackend>")
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates new application state with the given storage backend.
    #[must_use]
    pub fn new(config: Config, storage: Arc<dyn StorageBackend>) -> Self {
        let service = BasketService::new(BasketStore::new(Arc::clone(&storage)));
        Self {
            config,
            service,
            storage,
        }
    }

    /// Creates new application state with in-memory storage (for testing).
    #[must_use]
    pub fn with_memory_storage(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryBackend::new()))
    }

    /// Returns the basket service.
    #[must_use]
    pub fn basket_service(&self) -> &BasketService {
        &self.service
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn storage_backend(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.storage)
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// Returns 200 OK if the service is ready to accept requests.
/// Checks storage connectivity with a shallow `HEAD` probe.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = state.storage_backend();

    match backend.head(READY_CHECK_KEY).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some(format!("storage check failed: {e}")),
            }),
        ),
    }
}

/// `OpenAPI` spec endpoint handler.
async fn openapi_spec() -> Response {
    match crate::openapi::openapi_json() {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
        Err(e) => ApiError::internal(format!("failed to render OpenAPI spec: {e}")).into_response(),
    }
}

// ============================================================================
// Server
// ============================================================================

/// The pannier API server.
pub struct Server {
    config: Config,
    storage: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("storage", &"<StorageBackend>")
            .finish()
    }
}

impl Server {
    /// Creates a new server with the given configuration.
    ///
    /// Defaults to in-memory storage; use `with_storage_backend` for production.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            storage: Arc::new(MemoryBackend::new()),
        }
    }

    /// Creates a new server with an explicit storage backend.
    #[must_use]
    pub fn with_storage_backend(config: Config, storage: Arc<dyn StorageBackend>) -> Self {
        Self { config, storage }
    }

    /// Creates a new `ServerBuilder`.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(
            self.config.clone(),
            Arc::clone(&self.storage),
        ));

        // Build CORS layer from config
        let cors = self.build_cors_layer();

        let identity_layer =
            middleware::from_fn_with_state(Arc::clone(&state), crate::context::identity_middleware);
        let metrics_layer = middleware::from_fn(crate::metrics::metrics_middleware);

        Router::new()
            // Health, ready, metrics, and spec endpoints (no identity required)
            .route("/health", get(health))
            .route("/ready", get(ready))
            .route("/metrics", get(crate::metrics::serve_metrics))
            .route("/openapi.json", get(openapi_spec))
            // API routes (identity via extension-cached extractor)
            .nest("/api/v1", crate::routes::api_v1_routes().layer(identity_layer))
            // Middleware (order matters): Metrics outermost for timing, then trace, then CORS.
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(metrics_layer)
            // Shared state
            .with_state(state)
    }

    /// Builds the CORS layer from configuration.
    fn build_cors_layer(&self) -> CorsLayer {
        let cors_config = &self.config.cors;
        let cors = Self::build_cors_base(cors_config);
        Self::apply_cors_allowed_origins(cors, cors_config)
    }

    fn build_cors_base(cors_config: &CorsConfig) -> CorsLayer {
        CorsLayer::new()
            // Allow the basket REST methods + preflight
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            // Allow common headers including auth
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                // Custom headers for debug identity and correlation
                header::HeaderName::from_static("x-user-id"),
                header::HeaderName::from_static("x-request-id"),
            ])
            // Expose headers the browser needs to read
            .expose_headers([
                header::CONTENT_TYPE,
                header::CONTENT_LENGTH,
                header::HeaderName::from_static("retry-after"),
                header::HeaderName::from_static("x-request-id"),
            ])
            // Set max age for preflight caching
            .max_age(Duration::from_secs(cors_config.max_age_seconds))
    }

    fn cors_allows_any_origin(cors_config: &CorsConfig) -> bool {
        cors_config.allowed_origins.len() == 1
            && cors_config
                .allowed_origins
                .first()
                .is_some_and(|origin| origin == "*")
    }

    fn parse_cors_origins(cors_config: &CorsConfig) -> Vec<HeaderValue> {
        let mut allowed = Vec::new();
        for origin in &cors_config.allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => allowed.push(value),
                Err(_) => {
                    tracing::error!(
                        origin = %origin,
                        "Invalid CORS origin; expected a valid HeaderValue"
                    );
                }
            }
        }
        allowed
    }

    fn apply_cors_allowed_origins(cors: CorsLayer, cors_config: &CorsConfig) -> CorsLayer {
        if cors_config.allowed_origins.is_empty() {
            return cors;
        }

        if Self::cors_allows_any_origin(cors_config) {
            return cors.allow_origin(Any);
        }

        if cors_config
            .allowed_origins
            .iter()
            .any(|origin| origin == "*")
        {
            tracing::error!(
                origins = ?cors_config.allowed_origins,
                "Invalid CORS config: '*' must be the only allowed origin"
            );
            return cors;
        }

        let allowed = Self::parse_cors_origins(cors_config);

        if allowed.is_empty() {
            tracing::warn!("All configured CORS origins were invalid; disabling CORS");
            cors
        } else {
            tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the server cannot
    /// bind to the port.
    pub async fn serve(&self) -> Result<()> {
        self.validate_config()?;

        // Initialize metrics before starting the server
        crate::metrics::init_metrics();
        pannier_basket::metrics::register_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router();

        tracing::info!(
            http_port = self.config.http_port,
            "Starting pannier API server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// This is useful for integration tests where you want to test
    /// the routes without actually binding to a port.
    ///
    /// # Note
    ///
    /// This method is intended for testing only. It creates a router
    /// using this server's configured storage backend (default: in-memory).
    #[doc(hidden)]
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }

    fn validate_config(&self) -> Result<()> {
        // Enforce "no wildcard in production" for CORS.
        if !self.config.debug
            && self
                .config
                .cors
                .allowed_origins
                .iter()
                .any(|origin| origin == "*")
        {
            return Err(Error::InvalidInput(
                "cors.allowed_origins cannot include '*' when debug=false".to_string(),
            ));
        }

        if !self.config.debug && self.config.storage.bucket.is_none() {
            return Err(Error::InvalidInput(
                "storage.bucket is required when debug=false".to_string(),
            ));
        }

        // Require JWT configuration in production mode.
        if !self.config.debug {
            let has_hs256_secret = self.config.jwt.hs256_secret.is_some();
            let has_rs256_public_key = self.config.jwt.rs256_public_key_pem.is_some();

            if !has_hs256_secret && !has_rs256_public_key {
                return Err(Error::InvalidInput(
                    "jwt.hs256_secret or jwt.rs256_public_key_pem is required when debug=false"
                        .to_string(),
                ));
            }
            if has_hs256_secret && has_rs256_public_key {
                return Err(Error::InvalidInput(
                    "jwt.hs256_secret and jwt.rs256_public_key_pem are mutually exclusive"
                        .to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for constructing a server.
pub struct ServerBuilder {
    config: Config,
    storage: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("storage", &"<StorageBackend>")
            .finish()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            storage: Arc::new(MemoryBackend::new()),
        }
    }
}

impl ServerBuilder {
    /// Creates a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP port.
    #[must_use]
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Enables debug mode.
    ///
    /// See `Config::debug` for behavior changes (header-based identity vs JWT).
    #[must_use]
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Sets the JWT HS256 secret used for bearer token verification.
    ///
    /// Required when `debug` is false (unless an RS256 key is configured).
    #[must_use]
    pub fn jwt_hs256_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt.hs256_secret = Some(secret.into());
        self
    }

    /// Sets the shared secret guarding the `/metrics` endpoint.
    #[must_use]
    pub fn metrics_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.metrics_secret = Some(secret.into());
        self
    }

    /// Sets the storage backend used by request handlers.
    ///
    /// By default, the server uses an in-memory backend intended only for tests/dev.
    #[must_use]
    pub fn storage_backend(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = storage;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            storage: self.storage,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
