use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::repository::RepositoryError;

/// ApiError
///
/// Every failure a handler, extractor or the auth flow can surface to a caller.
/// The `Display` text is exactly what the caller sees, so variants that must not leak
/// detail carry fixed messages.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// Malformed input shape (bad JSON, failed field validation, dangling reference).
    #[error("{0}")]
    Validation(String),

    /// A unique field already exists.
    #[error("{0}")]
    Conflict(String),

    /// Login failed. Unknown email and wrong password both end up here.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, tampered or expired bearer token.
    #[error("missing or invalid token")]
    Unauthenticated,

    /// Valid identity, insufficient role.
    #[error("admin access required")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    /// Hashing, signing or persistence failure. The detail is logged, never returned.
    #[error("internal server error")]
    Internal(String),
}

/// ErrorResponse
///
/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Server error occurred");
            }
            other => {
                tracing::debug!(error = %other, status = %status, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(what) => ApiError::Conflict(format!("{what} already exists")),
            RepositoryError::MissingReference(what) => {
                ApiError::Validation(format!("{what} does not exist"))
            }
            RepositoryError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

/// Result type alias used by handlers and the auth flow.
pub type ApiResult<T> = Result<T, ApiError>;
