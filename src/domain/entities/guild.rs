//! Guild entity and repository trait.
//!
//! Maps to the `guilds` table. A guild always has its owner as a member and
//! exactly one default text channel at creation; both are inserted in the
//! same transaction as the guild row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Channel;
use crate::shared::error::AppError;

/// A top-level tenant containing channels and members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: Uuid,

    /// Display name (2-100 characters)
    pub name: String,

    /// Description (up to 500 characters)
    pub description: String,

    pub icon_url: Option<String>,

    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Guild {
    /// Create a new guild with a fresh time-ordered id.
    pub fn new(name: String, description: String, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            description,
            icon_url: None,
            owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Data-access contract for guilds.
#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Persist a new guild together with the owner membership and the
    /// default channel, atomically. Partial failure rolls everything back.
    async fn create_with_bootstrap(
        &self,
        guild: &Guild,
        default_channel: &Channel,
    ) -> Result<(), AppError>;

    /// Find a live (not soft-deleted) guild by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guild>, AppError>;

    /// All live guilds the user is a member of.
    async fn list_by_member(&self, user_id: Uuid) -> Result<Vec<Guild>, AppError>;

    /// Soft-delete the guild. `NotFound` if it does not exist.
    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError>;
}
