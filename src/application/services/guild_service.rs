//! Guild Service
//!
//! Guild lifecycle, channels, invites, and membership. Reads are gated on
//! membership, writes on ownership; the only permission tiers are owner and
//! member.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    Channel, ChannelKind, ChannelRepository, Guild, GuildInvite, GuildMember, GuildRepository,
    InviteRepository, MemberRepository,
};
use crate::shared::error::AppError;

/// Name of the text channel every new guild starts with.
const DEFAULT_CHANNEL_NAME: &str = "general";

pub struct GuildService<G, C, M, I>
where
    G: GuildRepository,
    C: ChannelRepository,
    M: MemberRepository,
    I: InviteRepository,
{
    guilds: Arc<G>,
    channels: Arc<C>,
    members: Arc<M>,
    invites: Arc<I>,
}

impl<G, C, M, I> GuildService<G, C, M, I>
where
    G: GuildRepository,
    C: ChannelRepository,
    M: MemberRepository,
    I: InviteRepository,
{
    pub fn new(guilds: Arc<G>, channels: Arc<C>, members: Arc<M>, invites: Arc<I>) -> Self {
        Self {
            guilds,
            channels,
            members,
            invites,
        }
    }

    /// Create a guild. The guild row, the owner membership, and the default
    /// text channel are one atomic unit.
    pub async fn create_guild(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Guild, AppError> {
        let name = name.trim();
        let name_len = name.chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(AppError::InvalidArgument(
                "guild name must be 2-100 characters".into(),
            ));
        }
        if description.chars().count() > 500 {
            return Err(AppError::InvalidArgument(
                "guild description must be at most 500 characters".into(),
            ));
        }

        let guild = Guild::new(name.to_string(), description.to_string(), owner_id);
        let default_channel = Channel::new(
            guild.id,
            DEFAULT_CHANNEL_NAME.to_string(),
            ChannelKind::Text,
            0,
        );

        self.guilds
            .create_with_bootstrap(&guild, &default_channel)
            .await?;

        tracing::info!(guild_id = %guild.id, owner_id = %owner_id, "guild created");
        Ok(guild)
    }

    /// Fetch a guild the caller is a member of.
    pub async fn get_guild(&self, guild_id: Uuid, caller_id: Uuid) -> Result<Guild, AppError> {
        self.require_member(guild_id, caller_id).await?;
        self.guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {guild_id}")))
    }

    /// All live guilds the caller belongs to.
    pub async fn list_my_guilds(&self, user_id: Uuid) -> Result<Vec<Guild>, AppError> {
        self.guilds.list_by_member(user_id).await
    }

    /// Soft-delete a guild. Owner only.
    pub async fn delete_guild(&self, guild_id: Uuid, caller_id: Uuid) -> Result<(), AppError> {
        let guild = self
            .guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {guild_id}")))?;

        if guild.owner_id != caller_id {
            return Err(AppError::PermissionDenied);
        }

        self.guilds.soft_delete(guild_id).await?;
        tracing::info!(guild_id = %guild_id, "guild deleted");
        Ok(())
    }

    /// Mint an invite code. Any member may invite.
    pub async fn create_invite(
        &self,
        guild_id: Uuid,
        caller_id: Uuid,
        max_uses: i32,
        expires_in_hours: i64,
    ) -> Result<GuildInvite, AppError> {
        self.require_member(guild_id, caller_id).await?;

        if max_uses < 0 {
            return Err(AppError::InvalidArgument("max_uses must not be negative".into()));
        }

        let expires_at = (expires_in_hours > 0).then(|| Utc::now() + Duration::hours(expires_in_hours));
        let invite = GuildInvite::new(guild_id, caller_id, max_uses, expires_at);

        self.invites.create(&invite).await?;
        Ok(invite)
    }

    /// Redeem an invite code, joining its guild.
    ///
    /// The membership upsert and the use-counter increment are one atomic
    /// unit. Joining a guild one already belongs to still consumes a use.
    pub async fn join_by_invite(&self, code: &str, user_id: Uuid) -> Result<Guild, AppError> {
        let invite = self
            .invites
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("invite not found".into()))?;

        if invite.is_expired(Utc::now()) {
            return Err(AppError::InvalidArgument("invite expired".into()));
        }
        if invite.is_exhausted() {
            return Err(AppError::InvalidArgument("invite max uses reached".into()));
        }

        self.invites
            .redeem(&invite.code, invite.guild_id, user_id)
            .await?;

        tracing::info!(guild_id = %invite.guild_id, user_id = %user_id, code = %invite.code, "invite redeemed");

        self.guilds
            .find_by_id(invite.guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {}", invite.guild_id)))
    }

    /// Leave a guild. The owner cannot leave; the guild must be deleted.
    pub async fn leave_guild(&self, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let guild = self
            .guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {guild_id}")))?;

        if guild.owner_id == user_id {
            return Err(AppError::InvalidArgument(
                "owner cannot leave guild, delete it instead".into(),
            ));
        }

        self.members.remove(guild_id, user_id).await
    }

    /// Create a channel. Owner only.
    pub async fn create_channel(
        &self,
        guild_id: Uuid,
        caller_id: Uuid,
        name: &str,
        kind: ChannelKind,
    ) -> Result<Channel, AppError> {
        let guild = self
            .guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {guild_id}")))?;

        if guild.owner_id != caller_id {
            return Err(AppError::PermissionDenied);
        }

        let name_len = name.chars().count();
        if !(1..=100).contains(&name_len) {
            return Err(AppError::InvalidArgument(
                "channel name must be 1-100 characters".into(),
            ));
        }

        let channel = Channel::new(guild_id, name.to_string(), kind, 0);
        self.channels.create(&channel).await?;
        Ok(channel)
    }

    /// Delete a channel. Owner only.
    pub async fn delete_channel(&self, channel_id: Uuid, caller_id: Uuid) -> Result<(), AppError> {
        let channel = self
            .channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("channel {channel_id}")))?;

        let guild = self
            .guilds
            .find_by_id(channel.guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("guild {}", channel.guild_id)))?;

        if guild.owner_id != caller_id {
            return Err(AppError::PermissionDenied);
        }

        self.channels.delete(channel_id).await
    }

    /// Channels of a guild. Members only.
    pub async fn list_channels(
        &self,
        guild_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Vec<Channel>, AppError> {
        self.require_member(guild_id, caller_id).await?;
        self.channels.list_by_guild(guild_id).await
    }

    /// Members of a guild. Members only.
    pub async fn list_members(
        &self,
        guild_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Vec<GuildMember>, AppError> {
        self.require_member(guild_id, caller_id).await?;
        self.members.list(guild_id).await
    }

    async fn require_member(&self, guild_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.members.is_member(guild_id, user_id).await? {
            return Err(AppError::PermissionDenied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> GuildService<MemoryStore, MemoryStore, MemoryStore, MemoryStore> {
        GuildService::new(
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
        )
    }

    #[tokio::test]
    async fn create_bootstraps_owner_and_general() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();

        // The owner is a member immediately after creation.
        let members = svc.list_members(guild.id, owner.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, owner.id);

        // Exactly one default text channel at position 0.
        let channels = svc.list_channels(guild.id, owner.id).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "general");
        assert_eq!(channels[0].kind, ChannelKind::Text);
        assert_eq!(channels[0].position, 0);
    }

    #[tokio::test]
    async fn create_validates_name_and_description() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");

        assert!(matches!(
            svc.create_guild(owner.id, "x", "").await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            svc.create_guild(owner.id, &"x".repeat(101), "").await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            svc.create_guild(owner.id, "Fox Den", &"d".repeat(501)).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn non_members_cannot_read() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let stranger = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();

        assert!(matches!(
            svc.get_guild(guild.id, stranger.id).await,
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            svc.list_channels(guild.id, stranger.id).await,
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            svc.list_members(guild.id, stranger.id).await,
            Err(AppError::PermissionDenied)
        ));
    }

    #[tokio::test]
    async fn only_the_owner_deletes() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let member = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 0, 0).await.unwrap();
        svc.join_by_invite(&invite.code, member.id).await.unwrap();

        assert!(matches!(
            svc.delete_guild(guild.id, member.id).await,
            Err(AppError::PermissionDenied)
        ));

        svc.delete_guild(guild.id, owner.id).await.unwrap();
        assert!(matches!(
            svc.get_guild(guild.id, owner.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn owner_cannot_leave() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();

        assert!(matches!(
            svc.leave_guild(guild.id, owner.id).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn member_can_leave() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let member = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 0, 0).await.unwrap();
        svc.join_by_invite(&invite.code, member.id).await.unwrap();

        svc.leave_guild(guild.id, member.id).await.unwrap();

        let members = svc.list_members(guild.id, owner.id).await.unwrap();
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn invites_are_member_only_and_bounded() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let stranger = store.seed_user("mallory");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();

        assert!(matches!(
            svc.create_invite(guild.id, stranger.id, 0, 0).await,
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            svc.create_invite(guild.id, owner.id, -1, 0).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn invite_exhaustion_is_enforced() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let carol = store.seed_user("carol");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 1, 1).await.unwrap();

        let joined = svc.join_by_invite(&invite.code, bob.id).await.unwrap();
        assert_eq!(joined.id, guild.id);

        let err = svc.join_by_invite(&invite.code, carol.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(err.to_string().contains("invite max uses reached"));
    }

    #[tokio::test]
    async fn expired_invite_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let bob = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let mut invite = svc.create_invite(guild.id, owner.id, 0, 1).await.unwrap();

        // Age the invite past its expiry.
        invite.expires_at = Some(Utc::now() - Duration::hours(2));
        store.replace_invite(invite.clone());

        let err = svc.join_by_invite(&invite.code, bob.id).await.unwrap_err();
        assert!(err.to_string().contains("invite expired"));
    }

    #[tokio::test]
    async fn invite_codes_match_case_insensitively() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let bob = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 0, 0).await.unwrap();

        let joined = svc
            .join_by_invite(&invite.code.to_lowercase(), bob.id)
            .await
            .unwrap();
        assert_eq!(joined.id, guild.id);
    }

    #[tokio::test]
    async fn rejoin_is_idempotent_but_consumes_a_use() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let bob = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 0, 0).await.unwrap();

        svc.join_by_invite(&invite.code, bob.id).await.unwrap();
        svc.join_by_invite(&invite.code, bob.id).await.unwrap();

        let members = svc.list_members(guild.id, owner.id).await.unwrap();
        assert_eq!(members.len(), 2);

        let stored = store.invite_by_code(&invite.code).unwrap();
        assert_eq!(stored.uses, 2);
    }

    #[tokio::test]
    async fn channel_writes_are_owner_only() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        let owner = store.seed_user("alice");
        let member = store.seed_user("bob");

        let guild = svc.create_guild(owner.id, "Fox Den", "").await.unwrap();
        let invite = svc.create_invite(guild.id, owner.id, 0, 0).await.unwrap();
        svc.join_by_invite(&invite.code, member.id).await.unwrap();

        assert!(matches!(
            svc.create_channel(guild.id, member.id, "random", ChannelKind::Text).await,
            Err(AppError::PermissionDenied)
        ));
        assert!(matches!(
            svc.create_channel(guild.id, owner.id, "", ChannelKind::Text).await,
            Err(AppError::InvalidArgument(_))
        ));

        let channel = svc
            .create_channel(guild.id, owner.id, "random", ChannelKind::Text)
            .await
            .unwrap();

        assert!(matches!(
            svc.delete_channel(channel.id, member.id).await,
            Err(AppError::PermissionDenied)
        ));
        svc.delete_channel(channel.id, owner.id).await.unwrap();
    }
}
