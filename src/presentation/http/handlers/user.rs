//! User Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::{SearchQuery, UpdateProfileRequest, UserResponse};
use crate::domain::UserPatch;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Profile of the authenticated caller.
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_profile(auth.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Profile of any user by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_profile(user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Partial update of the caller's profile. Absent fields stay untouched;
/// the nickname maps onto the handle.
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let patch = UserPatch {
        username: body.nickname,
        bio: body.bio,
        avatar_url: body.avatar_url,
    };

    let user = state.users.update_profile(auth.user_id, patch).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Soft-delete the caller's account.
pub async fn delete_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    state.users.delete_account(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search users by handle substring.
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .users
        .search_users(&query.q, query.limit.unwrap_or(0))
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
