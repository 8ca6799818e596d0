//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait. History reads
//! join the author row for display fields; the join deliberately includes
//! soft-deleted authors so old messages keep their attribution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Message, MessageRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    channel_id: Uuid,
    author_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    author_username: Option<String>,
    author_avatar_url: Option<String>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            author_id: self.author_id,
            content: self.content,
            created_at: self.created_at,
            edited_at: self.edited_at,
            author_username: self.author_username,
            author_avatar_url: self.author_avatar_url,
        }
    }
}

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.channel_id, m.author_id, m.content, m.created_at, m.edited_at,
           u.username AS author_username, u.avatar_url AS author_avatar_url
    FROM messages m
    JOIN users u ON u.id = m.author_id
"#;

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, channel_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.author_id)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn get_history(
        &self,
        channel_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> Result<Vec<Message>, AppError> {
        // Message ids are UUIDv7: byte order equals time order, so the cursor
        // comparison is a plain id comparison.
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{MESSAGE_SELECT} \
             WHERE m.channel_id = $1 AND ($2::uuid IS NULL OR m.id < $2) \
             ORDER BY m.created_at DESC \
             LIMIT $3"
        ))
        .bind(channel_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Newest-first fetch, oldest-first result.
        let mut messages: Vec<Message> = rows.into_iter().map(MessageRow::into_message).collect();
        messages.reverse();
        Ok(messages)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
