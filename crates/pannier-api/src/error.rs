//! API error types and HTTP response mapping.

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::HeaderName;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use pannier_basket::BasketError;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Retry-After hint attached to storage-unavailability responses.
const STORE_RETRY_AFTER_SECS: u64 = 5;

/// Standard JSON error response body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message (safe for clients).
    pub message: String,
    /// Optional request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// HTTP API error with stable machine-readable code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    request_id: Option<String>,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Returns an error response for invalid input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    /// Returns an error response for requests without a resolved identity.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
    }

    /// Returns an error response for missing resources.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Returns an error response when the basket store cannot be reached.
    ///
    /// Carries a `Retry-After` hint so well-behaved clients back off.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "STORE_UNAVAILABLE",
            message,
        )
        .with_retry_after(STORE_RETRY_AFTER_SECS)
    }

    /// Returns an internal error response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    /// Attaches a request ID for correlation.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches a Retry-After header value in seconds.
    #[must_use]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Returns the human-readable error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the request ID, if one was attached.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            request_id: None,
            retry_after_secs: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = self.request_id;
        let retry_after_secs = self.retry_after_secs;
        let mut response = (
            self.status,
            Json(ApiErrorBody {
                code: self.code.to_string(),
                message: self.message,
                request_id: request_id.clone(),
            }),
        )
            .into_response();

        if let Some(request_id) = request_id {
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("x-request-id"), value);
            }
        }

        if let Some(secs) = retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("retry-after"), value);
            }
        }

        response
    }
}

impl From<BasketError> for ApiError {
    fn from(value: BasketError) -> Self {
        match value {
            BasketError::Unauthenticated => Self::unauthenticated(value.to_string()),
            BasketError::Validation { message } => Self::validation(message),
            BasketError::NotFound { message } => Self::not_found(message),
            BasketError::Storage { message } => Self::store_unavailable(message),
            BasketError::Serialization { message } | BasketError::Internal { message } => {
                Self::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basket_errors_map_to_expected_statuses() {
        let error = ApiError::from(BasketError::Unauthenticated);
        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.code(), "UNAUTHENTICATED");

        let error = ApiError::from(BasketError::validation("bad quantity"));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "VALIDATION");

        let error = ApiError::from(BasketError::NotFound {
            message: "missing".to_string(),
        });
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.code(), "NOT_FOUND");

        let error = ApiError::from(BasketError::Storage {
            message: "backend down".to_string(),
        });
        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error.code(), "STORE_UNAVAILABLE");

        let error = ApiError::from(BasketError::Internal {
            message: "invariant".to_string(),
        });
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code(), "INTERNAL");
    }

    #[test]
    fn store_unavailable_carries_retry_after() {
        let error = ApiError::from(BasketError::Storage {
            message: "backend down".to_string(),
        });
        let response = error.into_response();

        let retry_after = response
            .headers()
            .get("retry-after")
            .expect("Retry-After header should be present");
        assert_eq!(retry_after.to_str().unwrap(), "5");
    }

    #[test]
    fn validation_error_has_no_retry_after() {
        let error = ApiError::validation("test");
        let response = error.into_response();

        assert!(response.headers().get("retry-after").is_none());
    }

    #[test]
    fn request_id_is_echoed_as_header() {
        let error = ApiError::not_found("nothing here").with_request_id("01J0000000000000000000000");
        let response = error.into_response();

        let header = response
            .headers()
            .get("x-request-id")
            .expect("x-request-id header should be present");
        assert_eq!(header.to_str().unwrap(), "01J0000000000000000000000");
    }
}
