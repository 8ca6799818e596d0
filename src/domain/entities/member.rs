//! Guild membership entity and repository trait.
//!
//! Maps to the `guild_members` table, keyed on (guild, user). Insertion is
//! idempotent: joining twice is a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A user's membership in a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMember {
    pub guild_id: Uuid,
    pub user_id: Uuid,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,

    // Display fields joined from the user row; not persisted on this table.
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl GuildMember {
    pub fn new(guild_id: Uuid, user_id: Uuid) -> Self {
        Self {
            guild_id,
            user_id,
            nickname: None,
            joined_at: Utc::now(),
            username: None,
            avatar_url: None,
        }
    }
}

/// Data-access contract for memberships.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Insert the membership if absent; a second join is a no-op.
    async fn add(&self, member: &GuildMember) -> Result<(), AppError>;

    async fn remove(&self, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    async fn is_member(&self, guild_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Members of a guild with display fields hydrated.
    async fn list(&self, guild_id: Uuid) -> Result<Vec<GuildMember>, AppError>;
}
