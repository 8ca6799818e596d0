//! In-memory store used by the service tests.
//!
//! One `MemoryStore` implements every repository trait over shared vectors,
//! so a single instance can back all of a service's ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use moka::sync::Cache as MokaCache;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::CacheSettings;
use crate::domain::{
    Channel, ChannelKind, ChannelRepository, Guild, GuildInvite, GuildMember, GuildRepository,
    InviteRepository, MemberRepository, Message, MessageRepository, User, UserPatch,
    UserRepository,
};
use crate::infrastructure::cache::CacheProvider;
use crate::shared::error::AppError;

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub guilds: Mutex<Vec<Guild>>,
    pub channels: Mutex<Vec<Channel>>,
    pub members: Mutex<Vec<GuildMember>>,
    pub invites: Mutex<Vec<GuildInvite>>,
    pub messages: Mutex<Vec<Message>>,

    pub users_find_calls: AtomicUsize,
    pub users_update_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn seed_user(&self, username: &str) -> User {
        let user = User::new(username.to_string(), format!("hash-of-{username}"));
        self.users.lock().push(user.clone());
        user
    }

    /// Seed a guild with its owner membership, as guild creation would.
    pub fn seed_guild(&self, name: &str, owner_id: Uuid) -> Uuid {
        let guild = Guild::new(name.to_string(), String::new(), owner_id);
        let guild_id = guild.id;
        self.guilds.lock().push(guild);
        self.members
            .lock()
            .push(GuildMember::new(guild_id, owner_id));
        guild_id
    }

    pub fn seed_member(&self, guild_id: Uuid, user_id: Uuid) {
        self.members.lock().push(GuildMember::new(guild_id, user_id));
    }

    pub fn seed_channel(&self, guild_id: Uuid, name: &str, kind: ChannelKind) -> Uuid {
        let channel = Channel::new(guild_id, name.to_string(), kind, 0);
        let channel_id = channel.id;
        self.channels.lock().push(channel);
        channel_id
    }

    pub fn invite_by_code(&self, code: &str) -> Option<GuildInvite> {
        self.invites
            .lock()
            .iter()
            .find(|i| i.code.eq_ignore_ascii_case(code))
            .cloned()
    }

    pub fn replace_invite(&self, invite: GuildInvite) {
        let mut invites = self.invites.lock();
        invites.retain(|i| !i.code.eq_ignore_ascii_case(&invite.code));
        invites.push(invite);
    }

    pub fn message_count(&self, channel_id: Uuid) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.lock();
        if users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(AppError::UsernameConflict);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.users_find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username) && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .iter()
            .find(|u| {
                u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
                    && u.deleted_at.is_none()
            })
            .cloned())
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), AppError> {
        self.users_update_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock();
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

        if let Some(username) = &patch.username {
            user.username = username.clone();
        }
        if let Some(bio) = &patch.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &patch.avatar_url {
            user.avatar_url = Some(avatar_url.clone());
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.lock();
        let user = users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        let query = query.to_lowercase();
        let limit = if limit <= 0 || limit > 50 { 20 } else { limit };
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&query) && u.deleted_at.is_none())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .lock()
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username) && u.deleted_at.is_none()))
    }
}

#[async_trait]
impl GuildRepository for MemoryStore {
    async fn create_with_bootstrap(
        &self,
        guild: &Guild,
        default_channel: &Channel,
    ) -> Result<(), AppError> {
        self.guilds.lock().push(guild.clone());
        self.members
            .lock()
            .push(GuildMember::new(guild.id, guild.owner_id));
        self.channels.lock().push(default_channel.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guild>, AppError> {
        Ok(self
            .guilds
            .lock()
            .iter()
            .find(|g| g.id == id && g.deleted_at.is_none())
            .cloned())
    }

    async fn list_by_member(&self, user_id: Uuid) -> Result<Vec<Guild>, AppError> {
        let member_of: Vec<Uuid> = self
            .members
            .lock()
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.guild_id)
            .collect();

        Ok(self
            .guilds
            .lock()
            .iter()
            .filter(|g| member_of.contains(&g.id) && g.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut guilds = self.guilds.lock();
        let guild = guilds
            .iter_mut()
            .find(|g| g.id == id && g.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("guild {id}")))?;
        guild.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn create(&self, channel: &Channel) -> Result<(), AppError> {
        self.channels.lock().push(channel.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Channel>, AppError> {
        Ok(self.channels.lock().iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_guild(&self, guild_id: Uuid) -> Result<Vec<Channel>, AppError> {
        let mut channels: Vec<Channel> = self
            .channels
            .lock()
            .iter()
            .filter(|c| c.guild_id == guild_id)
            .cloned()
            .collect();
        channels.sort_by_key(|c| (c.position, c.created_at));
        Ok(channels)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut channels = self.channels.lock();
        let before = channels.len();
        channels.retain(|c| c.id != id);
        if channels.len() == before {
            return Err(AppError::NotFound(format!("channel {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn add(&self, member: &GuildMember) -> Result<(), AppError> {
        let mut members = self.members.lock();
        if !members
            .iter()
            .any(|m| m.guild_id == member.guild_id && m.user_id == member.user_id)
        {
            members.push(member.clone());
        }
        Ok(())
    }

    async fn remove(&self, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.members
            .lock()
            .retain(|m| !(m.guild_id == guild_id && m.user_id == user_id));
        Ok(())
    }

    async fn is_member(&self, guild_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .members
            .lock()
            .iter()
            .any(|m| m.guild_id == guild_id && m.user_id == user_id))
    }

    async fn list(&self, guild_id: Uuid) -> Result<Vec<GuildMember>, AppError> {
        let users = self.users.lock();
        Ok(self
            .members
            .lock()
            .iter()
            .filter(|m| m.guild_id == guild_id)
            .cloned()
            .map(|mut m| {
                if let Some(user) = users.iter().find(|u| u.id == m.user_id) {
                    m.username = Some(user.username.clone());
                    m.avatar_url = user.avatar_url.clone();
                }
                m
            })
            .collect())
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn create(&self, invite: &GuildInvite) -> Result<(), AppError> {
        self.invites.lock().push(invite.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<GuildInvite>, AppError> {
        Ok(self.invite_by_code(code))
    }

    async fn redeem(&self, code: &str, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.add(&GuildMember::new(guild_id, user_id)).await?;

        let mut invites = self.invites.lock();
        if let Some(invite) = invites.iter_mut().find(|i| i.code.eq_ignore_ascii_case(code)) {
            invite.uses += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, message: &Message) -> Result<(), AppError> {
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Message>, AppError> {
        Ok(self.messages.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn get_history(
        &self,
        channel_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> Result<Vec<Message>, AppError> {
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .iter()
            .filter(|m| m.channel_id == channel_id && before.map_or(true, |b| m.id < b))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.id);

        // Newest `limit` entries, ascending, like the Postgres adapter.
        let take = limit.max(0) as usize;
        if messages.len() > take {
            let excess = messages.len() - take;
            messages.drain(..excess);
        }
        Ok(messages)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.messages.lock().retain(|m| m.id != id);
        Ok(())
    }
}

/// An enabled cache provider with only the in-process tier, for tests.
pub fn l1_only_cache_provider() -> Arc<CacheProvider> {
    let settings = CacheSettings {
        enabled: true,
        namespace: "roost-test".into(),
        schema_version: "v1".into(),
        ttl_seconds: 600,
        ttl_jitter: 0.15,
        l1_enabled: true,
        l1_max_bytes: 1024 * 1024,
        l1_ttl_seconds: 60,
        l1_metrics: false,
    };

    let l1 = MokaCache::builder()
        .max_capacity(settings.l1_max_bytes)
        .weigher(|key: &String, value: &Arc<Vec<u8>>| {
            u32::try_from(key.len() + value.len()).unwrap_or(u32::MAX)
        })
        .time_to_live(std::time::Duration::from_secs(settings.l1_ttl_seconds))
        .build();

    Arc::new(CacheProvider {
        redis: None,
        l1: Some(l1),
        settings,
    })
}
