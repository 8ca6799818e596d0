//! Membership Repository Implementation
//!
//! PostgreSQL implementation of the MemberRepository trait. The insert path
//! is an upsert on the composite key, so joining twice is a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{GuildMember, MemberRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    guild_id: Uuid,
    user_id: Uuid,
    nickname: Option<String>,
    joined_at: DateTime<Utc>,
    username: Option<String>,
    avatar_url: Option<String>,
}

impl MemberRow {
    fn into_member(self) -> GuildMember {
        GuildMember {
            guild_id: self.guild_id,
            user_id: self.user_id,
            nickname: self.nickname,
            joined_at: self.joined_at,
            username: self.username,
            avatar_url: self.avatar_url,
        }
    }
}

/// Idempotent membership insert through the given executor.
pub(crate) async fn upsert<'e, E>(executor: E, member: &GuildMember) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO guild_members (guild_id, user_id, nickname, joined_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (guild_id, user_id) DO NOTHING
        "#,
    )
    .bind(member.guild_id)
    .bind(member.user_id)
    .bind(&member.nickname)
    .bind(member.joined_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// PostgreSQL membership repository implementation.
#[derive(Clone)]
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn add(&self, member: &GuildMember) -> Result<(), AppError> {
        upsert(&self.pool, member).await
    }

    async fn remove(&self, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM guild_members WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn is_member(&self, guild_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM guild_members WHERE guild_id = $1 AND user_id = $2)",
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list(&self, guild_id: Uuid) -> Result<Vec<GuildMember>, AppError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT gm.guild_id, gm.user_id, gm.nickname, gm.joined_at,
                   u.username, u.avatar_url
            FROM guild_members gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.guild_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }
}
