//! Auth Handlers
//!
//! The public surface: register, login, refresh.

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::{LoginRequest, RefreshTokenRequest, RegisterRequest, RegisterResponse};
use crate::application::services::AuthTokens;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Create a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if body.username.is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidArgument(
            "username and password are required".into(),
        ));
    }

    let user_id = state.auth.register(&body.username, &body.password).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// Authenticate and receive an access/refresh pair.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthTokens>, AppError> {
    if body.username.is_empty() || body.password.is_empty() {
        return Err(AppError::InvalidArgument(
            "username and password are required".into(),
        ));
    }

    let tokens = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(tokens))
}

/// Rotate a refresh token into a fresh pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokens>, AppError> {
    if body.refresh_token.is_empty() {
        return Err(AppError::InvalidArgument("refresh_token is required".into()));
    }

    let tokens = state.auth.refresh_token(&body.refresh_token)?;
    Ok(Json(tokens))
}
