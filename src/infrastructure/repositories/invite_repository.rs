//! Invite Repository Implementation
//!
//! PostgreSQL implementation of the InviteRepository trait. Redemption is a
//! unit of work: the membership upsert and the use counter increment commit
//! together. The increment is a single in-store update so concurrent
//! redemptions cannot race a read-modify-write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::member_repository;
use crate::domain::{GuildInvite, GuildMember, InviteRepository};
use crate::infrastructure::database::with_transaction;
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    code: String,
    guild_id: Uuid,
    created_by: Uuid,
    expires_at: Option<DateTime<Utc>>,
    max_uses: i32,
    uses: i32,
    created_at: DateTime<Utc>,
}

impl InviteRow {
    fn into_invite(self) -> GuildInvite {
        GuildInvite {
            code: self.code,
            guild_id: self.guild_id,
            created_by: self.created_by,
            expires_at: self.expires_at,
            max_uses: self.max_uses,
            uses: self.uses,
            created_at: self.created_at,
        }
    }
}

/// Atomic use-counter increment through the given executor.
async fn increment_uses<'e, E>(executor: E, code: &str) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE invites SET uses = uses + 1 WHERE UPPER(code) = UPPER($1)")
        .bind(code)
        .execute(executor)
        .await?;

    Ok(())
}

/// PostgreSQL invite repository implementation.
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn create(&self, invite: &GuildInvite) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invites (code, guild_id, created_by, expires_at, max_uses, uses, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&invite.code)
        .bind(invite.guild_id)
        .bind(invite.created_by)
        .bind(invite.expires_at)
        .bind(invite.max_uses)
        .bind(invite.uses)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<GuildInvite>, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(
            "SELECT code, guild_id, created_by, expires_at, max_uses, uses, created_at \
             FROM invites WHERE UPPER(code) = UPPER($1)",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InviteRow::into_invite))
    }

    async fn redeem(&self, code: &str, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let code = code.to_string();
        let member = GuildMember::new(guild_id, user_id);

        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                member_repository::upsert(&mut **tx, &member).await?;
                increment_uses(&mut **tx, &code).await?;
                Ok(())
            })
        })
        .await
    }
}
