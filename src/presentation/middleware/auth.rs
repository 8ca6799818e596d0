//! Authentication Middleware
//!
//! Extracts the bearer credential from the `authorization` metadata,
//! validates it through the token service, and injects the caller identity
//! into the request for downstream handlers. Failure reasons distinguish
//! missing, malformed, expired, and invalid credentials.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::domain::Claims;
use crate::shared::error::AppError;
use crate::startup::AppState;
use uuid::Uuid;

/// Authenticated caller, injected as a request extension on protected
/// routes. Handlers extract it with `Extension<AuthUser>`; absence there
/// means the auth layer is missing from the route, which surfaces as an
/// internal error rather than a client failure.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

/// Validate the bearer token and enrich the request with the caller.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::TokenInvalid("missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::TokenInvalid("invalid authorization format".into()))?;

    let claims = state.tokens.validate_access(token)?;
    let user_id = claims.user_id()?;

    let auth_user = AuthUser { user_id, claims };
    request.extensions_mut().insert(auth_user.clone());

    let mut response = next.run(request).await;

    // Expose the identity to the logging layer, which runs outside of auth.
    response.extensions_mut().insert(auth_user);
    Ok(response)
}
