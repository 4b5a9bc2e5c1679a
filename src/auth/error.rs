// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::auth::models::Role;
use crate::error::ErrorResponse;

/// Authentication and authorization error types
///
/// Unknown username and wrong password deliberately share `InvalidCredentials`
/// so clients cannot probe which usernames exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    // Client input errors
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,

    // Token and header errors
    #[error("Missing Authorization header")]
    MissingToken,
    #[error("Invalid Authorization header format")]
    MalformedHeader,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Expired refresh token")]
    ExpiredRefreshToken,

    // Authorization errors
    /// Valid identity whose role is not among the endpoint's required roles
    #[error("Insufficient permissions: role '{actual}' is not allowed")]
    Forbidden { required: Vec<Role>, actual: Role },

    #[error("User not found")]
    UserNotFound,

    // Infrastructure errors
    #[error("Password hashing error")]
    PasswordHashError,
    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::InvalidToken | AuthError::ExpiredToken => {
                warn!("Rejected access token: {}", self)
            }
            AuthError::MissingToken | AuthError::MalformedHeader => {
                warn!("Rejected request: {}", self)
            }
            AuthError::InvalidRefreshToken | AuthError::ExpiredRefreshToken => {
                warn!("Rejected refresh attempt: {}", self)
            }
            AuthError::Forbidden { required, actual } => {
                warn!(
                    "Authorization failed: required one of {:?}, user has role '{}'",
                    required, actual
                )
            }
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            _ => {}
        }

        let body = ErrorResponse::new(self.error_code(), self.error_message());
        (self.status_code(), Json(body)).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::UsernameTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::InvalidRefreshToken
            | AuthError::ExpiredRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "VALIDATION_ERROR",
            AuthError::UsernameTaken => "USERNAME_TAKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::MalformedHeader => "MALFORMED_HEADER",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::ExpiredRefreshToken => "EXPIRED_REFRESH_TOKEN",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::UserNotFound => "NOT_FOUND",
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::Forbidden { .. } => "Forbidden: insufficient permissions".to_string(),
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(AuthError::ValidationError("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::UsernameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MalformedHeader.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidRefreshToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Forbidden { required: vec![Role::Admin], actual: Role::User }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::DatabaseError("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = AuthError::DatabaseError("password=hunter2 host=db".into());
        assert_eq!(err.error_message(), "Internal server error");
        let err = AuthError::TokenGenerationError("key material".into());
        assert_eq!(err.error_message(), "Internal server error");
    }

    #[test]
    fn test_forbidden_message_does_not_name_roles() {
        let err = AuthError::Forbidden { required: vec![Role::Admin], actual: Role::User };
        assert!(!err.error_message().contains("admin"));
    }
}
