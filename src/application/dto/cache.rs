//! Cache DTOs.
//!
//! Deliberately small: only the hot fields needed to render a profile in
//! lists. The cache key embeds a schema version; bump it when this layout
//! changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCacheDto {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}
