//! Guild Repository Implementation
//!
//! PostgreSQL implementation of the GuildRepository trait. Guild creation is
//! a unit of work: the guild row, the owner membership, and the default
//! channel commit together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::{channel_repository, member_repository};
use crate::domain::{Channel, Guild, GuildMember, GuildRepository};
use crate::infrastructure::database::with_transaction;
use crate::shared::error::AppError;

/// Database row representation matching the `guilds` table.
#[derive(Debug, sqlx::FromRow)]
struct GuildRow {
    id: Uuid,
    name: String,
    description: String,
    icon_url: Option<String>,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl GuildRow {
    fn into_guild(self) -> Guild {
        Guild {
            id: self.id,
            name: self.name,
            description: self.description,
            icon_url: self.icon_url,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

const GUILD_COLUMNS: &str =
    "id, name, description, icon_url, owner_id, created_at, updated_at, deleted_at";

/// Insert a guild row through the given executor (pool or transaction).
pub(crate) async fn insert<'e, E>(executor: E, guild: &Guild) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO guilds (id, name, description, icon_url, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(guild.id)
    .bind(&guild.name)
    .bind(&guild.description)
    .bind(&guild.icon_url)
    .bind(guild.owner_id)
    .bind(guild.created_at)
    .bind(guild.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// PostgreSQL guild repository implementation.
#[derive(Clone)]
pub struct PgGuildRepository {
    pool: PgPool,
}

impl PgGuildRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildRepository for PgGuildRepository {
    async fn create_with_bootstrap(
        &self,
        guild: &Guild,
        default_channel: &Channel,
    ) -> Result<(), AppError> {
        let guild = guild.clone();
        let channel = default_channel.clone();
        let owner_member = GuildMember::new(guild.id, guild.owner_id);

        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                insert(&mut **tx, &guild).await?;
                member_repository::upsert(&mut **tx, &owner_member).await?;
                channel_repository::insert(&mut **tx, &channel).await?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guild>, AppError> {
        let row = sqlx::query_as::<_, GuildRow>(&format!(
            "SELECT {GUILD_COLUMNS} FROM guilds WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GuildRow::into_guild))
    }

    async fn list_by_member(&self, user_id: Uuid) -> Result<Vec<Guild>, AppError> {
        let rows = sqlx::query_as::<_, GuildRow>(
            r#"
            SELECT g.id, g.name, g.description, g.icon_url, g.owner_id,
                   g.created_at, g.updated_at, g.deleted_at
            FROM guilds g
            JOIN guild_members gm ON gm.guild_id = g.id
            WHERE gm.user_id = $1 AND g.deleted_at IS NULL
            ORDER BY g.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GuildRow::into_guild).collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE guilds SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("guild {id}")));
        }

        Ok(())
    }
}
