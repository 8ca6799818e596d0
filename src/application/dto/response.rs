//! Response DTOs.
//!
//! Mechanical projections of domain entities onto the wire. Timestamps
//! serialize as RFC 3339.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Channel, Guild, GuildInvite, GuildMember, Message, User};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            bio: user.bio,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GuildResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Guild> for GuildResponse {
    fn from(guild: Guild) -> Self {
        Self {
            id: guild.id,
            name: guild.name,
            description: guild.description,
            icon_url: guild.icon_url,
            owner_id: guild.owner_id,
            created_at: guild.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChannelResponse {
    pub id: Uuid,
    pub guild_id: Uuid,
    pub name: String,
    pub kind: String,
    pub position: i32,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            guild_id: channel.guild_id,
            name: channel.name,
            kind: channel.kind.as_str().to_string(),
            position: channel.position,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<GuildMember> for MemberResponse {
    fn from(member: GuildMember) -> Self {
        Self {
            user_id: member.user_id,
            username: member.username,
            avatar_url: member.avatar_url,
            nickname: member.nickname,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub code: String,
    pub guild_id: Uuid,
    pub max_uses: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<GuildInvite> for InviteResponse {
    fn from(invite: GuildInvite) -> Self {
        Self {
            code: invite.code,
            guild_id: invite.guild_id,
            max_uses: invite.max_uses,
            expires_at: invite.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author_id,
            author_username: message.author_username,
            author_avatar_url: message.author_avatar_url,
            content: message.content,
            created_at: message.created_at,
            edited_at: message.edited_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageResponse>,
    pub has_more: bool,
}
