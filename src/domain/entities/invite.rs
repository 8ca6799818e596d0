//! Guild invite entity and repository trait.
//!
//! Maps to the `invites` table. The code is the primary key: 8 characters of
//! the base32 alphabet, no padding, matched case-insensitively at redemption.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Invite code length in characters.
pub const INVITE_CODE_LEN: usize = 8;

/// RFC 4648 base32 alphabet (no padding).
const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// A short code authorizing its bearer to join a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildInvite {
    pub code: String,
    pub guild_id: Uuid,
    pub created_by: Uuid,
    /// None = never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// 0 = unlimited
    pub max_uses: i32,
    pub uses: i32,
    pub created_at: DateTime<Utc>,
}

impl GuildInvite {
    /// Create a new invite with a freshly generated code.
    pub fn new(
        guild_id: Uuid,
        created_by: Uuid,
        max_uses: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code: Self::generate_code(),
            guild_id,
            created_by,
            expires_at,
            max_uses,
            uses: 0,
            created_at: Utc::now(),
        }
    }

    /// Generate a random 8-character base32 code.
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..INVITE_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
                INVITE_CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    /// True once the expiry timestamp has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// True once a bounded invite has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.uses >= self.max_uses
    }
}

/// Data-access contract for invites.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &GuildInvite) -> Result<(), AppError>;

    /// Look up an invite, matching the code case-insensitively.
    async fn find_by_code(&self, code: &str) -> Result<Option<GuildInvite>, AppError>;

    /// Redeem: upsert the membership and increment `uses` atomically, in one
    /// transaction. The increment is a single in-store update, never a
    /// read-modify-write.
    async fn redeem(&self, code: &str, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError>;
}
