// Error handling module for the Book API
// Provides the shared error response body and the top-level handler error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Error type returned by HTTP handlers
///
/// Wraps the authentication taxonomy and adds the failures that originate
/// outside it (request validation, network policy).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed validation. Maps to HTTP 400
    #[error("Request validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Authentication or authorization failure, status decided by the variant
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Request rejected by network policy. Maps to HTTP 403
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Consistent error response structure
///
/// Every error body in the API has this shape: a machine-readable code, a
/// human-readable message, optional details and the time of the failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "INVALID_CREDENTIALS")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g. field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                let body = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(serde_json::to_value(&errors).unwrap_or(serde_json::json!({})));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (StatusCode::FORBIDDEN, Json(ErrorResponse::new("FORBIDDEN", message)))
                    .into_response()
            }
        }
    }
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(err) => err.status_code(),
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}
