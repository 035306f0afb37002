//! Caller identity extraction and middleware.
//!
//! In debug mode, the basket owner is supplied via the `X-User-Id` header
//! for local development. In production mode, the owner is extracted from a
//! verified JWT claim (default `sub`, configurable via
//! `PANNIER_JWT_OWNER_CLAIM`).
//!
//! Identity resolution is total: a missing, malformed, or invalid credential
//! resolves to an *anonymous* caller rather than a transport error. Reads
//! tolerate anonymity; mutations reject it in the service layer, so the
//! decision lives in exactly one place.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::extract::State;
use axum::http::header::HeaderName;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;
use ulid::Ulid;

use pannier_core::OwnerId;

use crate::error::ApiError;
use crate::server::AppState;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identity derived from authentication and headers.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Resolved basket owner, absent for anonymous callers.
    pub owner: Option<OwnerId>,
    /// Request ID for tracing/correlation.
    pub request_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<Self>() {
            return Ok(existing.clone());
        }

        let headers = &parts.headers;

        let request_id =
            request_id_from_headers(headers).unwrap_or_else(|| Ulid::new().to_string());

        let raw_owner = if state.config.debug {
            owner_from_headers(headers)
        } else {
            owner_from_jwt(headers, state)
        };

        let owner = raw_owner.and_then(|raw| match OwnerId::new(&raw) {
            Ok(owner) => Some(owner),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "resolved owner identifier is not usable; treating caller as anonymous"
                );
                None
            }
        });

        let identity = Self { owner, request_id };

        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}

fn owner_from_jwt(headers: &HeaderMap, state: &AppState) -> Option<String> {
    let token = bearer_token(headers)?;

    let (decoding_key, algorithm) = match jwt_decoding_key(&state.config.jwt) {
        Ok(pair) => pair,
        Err(message) => {
            tracing::error!(%message, "JWT verification key unavailable; treating caller as anonymous");
            return None;
        }
    };

    let mut validation = Validation::new(algorithm);
    validation.validate_nbf = true;

    if let Some(iss) = state.config.jwt.issuer.as_deref() {
        validation.set_issuer(&[iss]);
    }
    if let Some(aud) = state.config.jwt.audience.as_deref() {
        validation.set_audience(&[aud]);
    }

    let data = match jsonwebtoken::decode::<Value>(&token, &decoding_key, &validation) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(error = %e, "invalid bearer token; treating caller as anonymous");
            return None;
        }
    };

    let claim = state.config.jwt.owner_claim.as_str();
    let owner = data
        .claims
        .as_object()
        .and_then(|obj| obj.get(claim))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    if owner.is_none() {
        tracing::warn!(claim, "bearer token carries no owner claim; treating caller as anonymous");
    }
    owner
}

fn jwt_decoding_key(jwt: &crate::config::JwtConfig) -> Result<(DecodingKey, Algorithm), String> {
    match (
        jwt.hs256_secret.as_deref(),
        jwt.rs256_public_key_pem.as_deref(),
    ) {
        (Some(secret), None) => Ok((DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)),
        (None, Some(pem)) => DecodingKey::from_rsa_pem(pem.as_bytes())
            .map(|key| (key, Algorithm::RS256))
            .map_err(|e| format!("failed to parse jwt.rs256_public_key_pem: {e}")),
        (Some(_), Some(_)) => Err(
            "jwt.hs256_secret and jwt.rs256_public_key_pem are mutually exclusive".to_string(),
        ),
        (None, None) => Err(
            "jwt.hs256_secret or jwt.rs256_public_key_pem is required when debug=false".to_string(),
        ),
    }
}

fn request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    header_string(headers, "X-Request-Id").or_else(|| header_string(headers, "X-Request-ID"))
}

fn owner_from_headers(headers: &HeaderMap) -> Option<String> {
    header_string(headers, "X-User-Id").or_else(|| header_string(headers, "X-User-ID"))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = header_string(headers, "Authorization")?;
    let token = raw.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?;
    value.to_str().ok().map(str::to_string)
}

/// Identity middleware.
///
/// Resolves the caller identity once per request, injects it into request
/// extensions, and echoes the request ID on the response.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let identity = match Identity::from_request_parts(&mut parts, &state).await {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    let mut req = Request::from_parts(parts, body);
    let request_id = identity.request_id.clone();
    req.extensions_mut().insert(identity);

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
