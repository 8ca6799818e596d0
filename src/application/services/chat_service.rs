//! Chat Service
//!
//! Message send, history, and stream authorization. A send publishes its
//! event to the hub only after the store write succeeded, so subscribers
//! observe messages in commit order; publication itself is fire-and-forget
//! and never fails the call.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    ChannelKind, ChannelRepository, MemberRepository, Message, MessageRepository,
};
use crate::infrastructure::hub::{ChannelEvent, Hub, MessageCreated, MessageDeleted};
use crate::shared::error::AppError;

/// Default and maximum page size of a history read.
const HISTORY_DEFAULT_LIMIT: i64 = 50;
const HISTORY_MAX_LIMIT: i64 = 100;

/// Maximum message body length in characters.
const MESSAGE_MAX_CHARS: usize = 4000;

pub struct ChatService<Msg, C, M>
where
    Msg: MessageRepository,
    C: ChannelRepository,
    M: MemberRepository,
{
    messages: Arc<Msg>,
    channels: Arc<C>,
    members: Arc<M>,
    hub: Arc<Hub>,
}

impl<Msg, C, M> ChatService<Msg, C, M>
where
    Msg: MessageRepository,
    C: ChannelRepository,
    M: MemberRepository,
{
    pub fn new(messages: Arc<Msg>, channels: Arc<C>, members: Arc<M>, hub: Arc<Hub>) -> Self {
        Self {
            messages,
            channels,
            members,
            hub,
        }
    }

    /// Persist a message, then fan it out to live subscribers.
    pub async fn send_message(
        &self,
        channel_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Message, AppError> {
        let len = content.chars().count();
        if len == 0 || len > MESSAGE_MAX_CHARS {
            return Err(AppError::InvalidArgument(
                "message content must be 1-4000 characters".into(),
            ));
        }

        let channel = self
            .channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("channel {channel_id}")))?;

        if channel.kind != ChannelKind::Text {
            return Err(AppError::InvalidArgument(
                "cannot send text message to voice channel".into(),
            ));
        }

        if !self.members.is_member(channel.guild_id, author_id).await? {
            return Err(AppError::PermissionDenied);
        }

        let message = Message::new(channel_id, author_id, content.to_string());
        self.messages.create(&message).await?;

        // Publish after successful persist. Not atomic with it: a crash in
        // between loses only the live event, history stays authoritative.
        self.hub.publish(
            channel_id,
            &ChannelEvent::MessageCreated(message_created(&message)),
        );

        Ok(message)
    }

    /// A page of history strictly older than the cursor, ascending by time.
    pub async fn get_history(
        &self,
        channel_id: Uuid,
        caller_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> Result<(Vec<Message>, bool), AppError> {
        let channel = self
            .channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("channel {channel_id}")))?;

        if !self.members.is_member(channel.guild_id, caller_id).await? {
            return Err(AppError::PermissionDenied);
        }

        let limit = if limit <= 0 || limit > HISTORY_MAX_LIMIT {
            HISTORY_DEFAULT_LIMIT
        } else {
            limit
        };

        // Fetch one extra row to learn whether older history exists.
        let mut messages = self
            .messages
            .get_history(channel_id, limit + 1, before)
            .await?;

        let has_more = messages.len() as i64 > limit;
        if has_more {
            let excess = messages.len() - limit as usize;
            messages.drain(..excess);
        }

        Ok((messages, has_more))
    }

    /// Delete a message. Authors may delete their own messages only.
    pub async fn delete_message(&self, message_id: Uuid, caller_id: Uuid) -> Result<(), AppError> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))?;

        if message.author_id != caller_id {
            return Err(AppError::PermissionDenied);
        }

        self.messages.delete(message_id).await?;

        self.hub.publish(
            message.channel_id,
            &ChannelEvent::MessageDeleted(MessageDeleted {
                message_id,
                channel_id: message.channel_id,
            }),
        );

        Ok(())
    }

    /// Authorize a stream subscription on a channel.
    pub async fn can_subscribe(&self, channel_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let channel = self
            .channels
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("channel {channel_id}")))?;

        if !self.members.is_member(channel.guild_id, user_id).await? {
            return Err(AppError::PermissionDenied);
        }

        Ok(())
    }

    /// The hub, for the transport layer to bind subscriptions.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }
}

fn message_created(message: &Message) -> MessageCreated {
    MessageCreated {
        id: message.id,
        channel_id: message.channel_id,
        author_id: message.author_id,
        author_username: message.author_username.clone(),
        author_avatar_url: message.author_avatar_url.clone(),
        content: message.content.clone(),
        created_at: message.created_at,
        edited_at: message.edited_at,
    }
}
