//! Channel entity and repository trait.
//!
//! Maps to the `channels` table. A channel's lifecycle is bound to its
//! guild; only the guild owner creates or deletes channels.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Channel kind, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Text,
    Voice,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ChannelKind::Text),
            "voice" => Some(ChannelKind::Voice),
            _ => None,
        }
    }
}

/// A messaging surface inside a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,

    pub guild_id: Uuid,

    /// Display name (1-100 characters)
    pub name: String,

    pub kind: ChannelKind,

    /// Ordering position inside the guild
    pub position: i32,

    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// Create a new channel with a fresh time-ordered id.
    pub fn new(guild_id: Uuid, name: String, kind: ChannelKind, position: i32) -> Self {
        Self {
            id: Uuid::now_v7(),
            guild_id,
            name,
            kind,
            position,
            created_at: Utc::now(),
        }
    }
}

/// Data-access contract for channels.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn create(&self, channel: &Channel) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Channel>, AppError>;

    /// Channels of a guild ordered by position, then creation time.
    async fn list_by_guild(&self, guild_id: Uuid) -> Result<Vec<Channel>, AppError>;

    /// `NotFound` if the channel does not exist.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
