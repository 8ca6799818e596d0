//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait. Handles and emails
//! are matched case-insensitively; deletes are soft so message authorship
//! survives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::map_unique_violation;
use crate::domain::{User, UserPatch, UserRepository};
use crate::shared::error::AppError;

/// Database row representation matching the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    home_realm: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            avatar_url: self.avatar_url,
            bio: self.bio,
            home_realm: self.home_realm,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, avatar_url, bio, home_realm, \
                            created_at, updated_at, deleted_at";

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, avatar_url, bio,
                               home_realm, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(&user.home_realm)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(username) = &patch.username {
            qb.push(", username = ").push_bind(username);
        }
        if let Some(bio) = &patch.bio {
            qb.push(", bio = ").push_bind(bio);
        }
        if let Some(avatar_url) = &patch.avatar_url {
            qb.push(", avatar_url = ").push_bind(avatar_url);
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {id}")));
        }

        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {id}")));
        }

        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        let limit = if limit <= 0 || limit > 50 { 20 } else { limit };
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE LOWER(username) LIKE LOWER($1) AND deleted_at IS NULL \
             ORDER BY username ASC LIMIT $2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users \
             WHERE LOWER(username) = LOWER($1) AND deleted_at IS NULL)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// Escape SQL LIKE metacharacters in user-supplied search input.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
