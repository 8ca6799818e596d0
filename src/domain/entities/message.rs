//! Message entity and repository trait.
//!
//! Maps to the `messages` table. Ids are UUIDv7, so id order equals
//! chronological order; history pagination compares ids directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A text message in a channel.
///
/// Immutable after creation except for `content`/`edited_at`. Authorship may
/// reference soft-deleted users; the display fields below are hydrated by a
/// join when loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub author_id: Uuid,

    /// Body (1-4000 characters)
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,

    // Joined author display fields; not columns of `messages`.
    pub author_username: Option<String>,
    pub author_avatar_url: Option<String>,
}

impl Message {
    /// Create a new message with a fresh time-ordered id.
    pub fn new(channel_id: Uuid, author_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            channel_id,
            author_id,
            content,
            created_at: Utc::now(),
            edited_at: None,
            author_username: None,
            author_avatar_url: None,
        }
    }
}

/// Data-access contract for messages.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError>;

    /// Up to `limit` messages strictly older than `before` (newest when
    /// absent), returned ascending by time with author fields hydrated.
    /// Callers pass `limit + 1` to detect whether more history exists.
    async fn get_history(
        &self,
        channel_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> Result<Vec<Message>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
