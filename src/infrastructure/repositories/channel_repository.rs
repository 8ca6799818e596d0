//! Channel Repository Implementation
//!
//! PostgreSQL implementation of the ChannelRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{Channel, ChannelKind, ChannelRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: Uuid,
    guild_id: Uuid,
    name: String,
    kind: String,
    position: i32,
    created_at: DateTime<Utc>,
}

impl ChannelRow {
    fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            guild_id: self.guild_id,
            name: self.name,
            kind: ChannelKind::parse(&self.kind).unwrap_or_default(),
            position: self.position,
            created_at: self.created_at,
        }
    }
}

/// Insert a channel row through the given executor (pool or transaction).
pub(crate) async fn insert<'e, E>(executor: E, channel: &Channel) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO channels (id, guild_id, name, kind, position, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(channel.id)
    .bind(channel.guild_id)
    .bind(&channel.name)
    .bind(channel.kind.as_str())
    .bind(channel.position)
    .bind(channel.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// PostgreSQL channel repository implementation.
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn create(&self, channel: &Channel) -> Result<(), AppError> {
        insert(&self.pool, channel).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, guild_id, name, kind, position, created_at \
             FROM channels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ChannelRow::into_channel))
    }

    async fn list_by_guild(&self, guild_id: Uuid) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, guild_id, name, kind, position, created_at \
             FROM channels WHERE guild_id = $1 \
             ORDER BY position ASC, created_at ASC",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChannelRow::into_channel).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("channel {id}")));
        }

        Ok(())
    }
}
