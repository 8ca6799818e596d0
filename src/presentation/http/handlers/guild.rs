//! Guild Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::{
    ChannelResponse, CreateChannelRequest, CreateGuildRequest, CreateInviteRequest, GuildResponse,
    InviteResponse, MemberResponse,
};
use crate::domain::ChannelKind;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Create a guild with its default channel and owner membership.
pub async fn create_guild(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateGuildRequest>,
) -> Result<(StatusCode, Json<GuildResponse>), AppError> {
    let guild = state
        .guilds
        .create_guild(auth.user_id, &body.name, &body.description)
        .await?;

    Ok((StatusCode::CREATED, Json(GuildResponse::from(guild))))
}

/// Guilds the caller belongs to.
pub async fn list_my_guilds(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<GuildResponse>>, AppError> {
    let guilds = state.guilds.list_my_guilds(auth.user_id).await?;
    Ok(Json(guilds.into_iter().map(GuildResponse::from).collect()))
}

pub async fn get_guild(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
) -> Result<Json<GuildResponse>, AppError> {
    let guild = state.guilds.get_guild(guild_id, auth.user_id).await?;
    Ok(Json(GuildResponse::from(guild)))
}

pub async fn delete_guild(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.guilds.delete_guild(guild_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_guild_channels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let channels = state.guilds.list_channels(guild_id, auth.user_id).await?;
    Ok(Json(
        channels.into_iter().map(ChannelResponse::from).collect(),
    ))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<ChannelResponse>), AppError> {
    let kind = ChannelKind::parse(&body.kind)
        .ok_or_else(|| AppError::InvalidArgument("channel kind must be text or voice".into()))?;

    let channel = state
        .guilds
        .create_channel(guild_id, auth.user_id, &body.name, kind)
        .await?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(channel))))
}

pub async fn get_guild_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let members = state.guilds.list_members(guild_id, auth.user_id).await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
    Json(body): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    let invite = state
        .guilds
        .create_invite(guild_id, auth.user_id, body.max_uses, body.expires_in_hours)
        .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

pub async fn leave_guild(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(guild_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.guilds.leave_guild(guild_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redeem an invite code, joining its guild.
pub async fn join_by_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Result<Json<GuildResponse>, AppError> {
    let guild = state.guilds.join_by_invite(&code, auth.user_id).await?;
    Ok(Json(GuildResponse::from(guild)))
}
