//! Channel and Message Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::{
    HistoryQuery, HistoryResponse, MessageResponse, SendMessageRequest,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn delete_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.guilds.delete_channel(channel_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Publish a message to a text channel.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let message = state
        .chat
        .send_message(channel_id, auth.user_id, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// A page of channel history, ascending by time.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let (messages, has_more) = state
        .chat
        .get_history(
            channel_id,
            auth.user_id,
            query.limit.unwrap_or(0),
            query.before,
        )
        .await?;

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
        has_more,
    }))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((_channel_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state.chat.delete_message(message_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
