//! User Profile Service
//!
//! Profile reads go through the cache tier; mutations invalidate it and
//! re-read the fresh entity so the caller never observes a stale write.

use std::sync::Arc;

use chrono::DateTime;
use uuid::Uuid;

use crate::application::dto::UserCacheDto;
use crate::domain::{User, UserPatch, UserRepository};
use crate::infrastructure::cache::{CacheManager, CacheProvider};
use crate::shared::error::AppError;

pub struct UserService<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    cache: CacheManager<UserCacheDto>,
}

impl<U> UserService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>, cache_provider: Arc<CacheProvider>) -> Self {
        Self {
            users,
            cache: CacheManager::new(cache_provider, "users"),
        }
    }

    /// Load a profile through the cache tier.
    ///
    /// The cache stores a compact DTO; fields it does not carry come back
    /// empty on the rehydrated entity.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, AppError> {
        let users = Arc::clone(&self.users);

        let dto = self
            .cache
            .get_or_set(&user_id.to_string(), || async move {
                let user = users.find_by_id(user_id).await?;
                Ok(user.map(|u| UserCacheDto {
                    id: u.id,
                    username: u.username,
                    avatar_url: u.avatar_url,
                }))
            })
            .await?;

        Ok(User {
            id: dto.id,
            username: dto.username,
            email: None,
            password_hash: String::new(),
            avatar_url: dto.avatar_url,
            bio: None,
            home_realm: String::new(),
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
            deleted_at: None,
        })
    }

    /// Apply a partial profile update. An empty patch skips the store
    /// entirely; any write invalidates the cached profile.
    pub async fn update_profile(&self, user_id: Uuid, patch: UserPatch) -> Result<User, AppError> {
        if !patch.is_empty() {
            self.users.update(user_id, &patch).await?;

            if let Err(e) = self.cache.invalidate(&user_id.to_string()).await {
                tracing::warn!(user_id = %user_id, error = %e, "profile cache invalidation failed");
            }
        }

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    /// Substring search over handles.
    pub async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        self.users.search(query, limit).await
    }

    /// Soft-delete the account. Authorship of past messages survives.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users.soft_delete(user_id).await?;

        if let Err(e) = self.cache.invalidate(&user_id.to_string()).await {
            tracing::warn!(user_id = %user_id, error = %e, "profile cache invalidation failed");
        }

        Ok(())
    }
}
