//! Application Error Types
//!
//! The domain error taxonomy and its mapping onto transport status codes.
//! Services return these sentinels directly; the transport boundary is the
//! only layer that turns them into client-visible responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("token invalid: {0}")]
    TokenInvalid(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("username already taken")]
    UsernameConflict,

    #[error("email already in use")]
    EmailConflict,

    #[error("permission denied")]
    PermissionDenied,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl AppError {
    /// Status code this error maps to on the wire.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) | AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_)
            | AppError::UsernameConflict
            | AppError::EmailConflict => StatusCode::CONFLICT,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Database(_) | AppError::Redis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal failures are logged server-side and elided for the client.
        let message = match &self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            AppError::Redis(e) => {
                tracing::error!(error = %e, "cache error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_unauthenticated() {
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::TokenInvalid("bad".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn permission_errors_map_to_forbidden() {
        assert_eq!(
            AppError::PermissionDenied.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unauthorized("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflicts_map_to_conflict() {
        assert_eq!(AppError::UsernameConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::EmailConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::AlreadyExists("guild".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_errors_are_opaque() {
        // The message must not leak through the response mapping.
        let err = AppError::Internal("connection pool exhausted".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_argument_maps_to_bad_request() {
        assert_eq!(
            AppError::InvalidArgument("too long".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("user".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
