//! User entity and repository trait.
//!
//! Maps to the `users` table. Users are soft-deleted so message authorship
//! can keep referencing them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a user account.
///
/// The id is a UUIDv7, so ids sort chronologically. `home_realm` tags which
/// deployment the account originates from ("local" for this one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Unique handle, case-insensitive (3-32 characters)
    pub username: String,

    /// Optional email, case-insensitive unique
    pub email: Option<String>,

    /// Password verifier (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub avatar_url: Option<String>,

    pub bio: Option<String>,

    pub home_realm: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new local user with a fresh time-ordered id.
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username,
            email: None,
            password_hash,
            avatar_url: None,
            bio: None,
            home_realm: "local".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Partial update of mutable profile fields.
///
/// Identity, credentials, and bookkeeping columns are not representable here,
/// so they cannot be touched through the update path.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

/// Data-access contract for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Unique violations surface as
    /// `UsernameConflict` / `EmailConflict`.
    async fn create(&self, user: &User) -> Result<(), AppError>;

    /// Find a live user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Find a live user by handle, case-insensitive.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Find a live user by email, case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Apply a partial profile update. `NotFound` if the user does not exist.
    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), AppError>;

    /// Soft-delete the user (sets `deleted_at`, keeps the row).
    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Search users by handle substring. Limit is clamped to at most 50.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError>;

    /// Check handle availability without loading the record.
    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError>;
}
