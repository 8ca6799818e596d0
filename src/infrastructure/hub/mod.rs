//! Pub/Sub Hub
//!
//! In-process fan-out of channel events to live stream subscribers. Sending
//! a message publishes it to every active subscriber of that channel.
//!
//! Backpressure policy: publishers never block. A subscriber whose queue is
//! full drops the event, for that subscriber alone, and is expected to
//! reconcile through a history fetch. The live plane prefers timeliness over
//! completeness.
//!
//! The hub is intentionally process-local; cross-process fan-out would need
//! a sticky routing layer or a real broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-subscriber event queue depth. A slow consumer loses events beyond
/// this, never the publisher's time.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 32;

/// Events fanned out to channel subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChannelEvent {
    MessageCreated(MessageCreated),
    MessageDeleted(MessageDeleted),
}

/// Payload of a `message_created` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreated {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// Payload of a `message_deleted` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeleted {
    pub message_id: Uuid,
    pub channel_id: Uuid,
}

type SubscriberMap = HashMap<Uuid, HashMap<u64, mpsc::Sender<ChannelEvent>>>;

/// Channel subscription hub. Safe for concurrent use: publish takes the read
/// lock, subscribe/unsubscribe take the write lock; the queues themselves
/// are lock-free bounded channels.
pub struct Hub {
    subscribers: RwLock<SubscriberMap>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a subscriber on a channel. Dropping the returned subscription
    /// unsubscribes, closes its queue, and prunes the channel entry if empty.
    pub fn subscribe(self: &Arc<Self>, channel_id: Uuid) -> ChannelSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);

        self.subscribers
            .write()
            .entry(channel_id)
            .or_default()
            .insert(id, tx);

        ChannelSubscription {
            hub: Arc::clone(self),
            channel_id,
            id,
            receiver: rx,
        }
    }

    /// Fan an event out to every subscriber of the channel. A full queue
    /// drops the event for that subscriber only.
    pub fn publish(&self, channel_id: Uuid, event: &ChannelEvent) {
        let guard = self.subscribers.read();
        if let Some(subs) = guard.get(&channel_id) {
            for tx in subs.values() {
                let _ = tx.try_send(event.clone());
            }
        }
    }

    /// Number of live subscriptions on a channel.
    pub fn subscriber_count(&self, channel_id: Uuid) -> usize {
        self.subscribers
            .read()
            .get(&channel_id)
            .map_or(0, HashMap::len)
    }

    fn unsubscribe(&self, channel_id: Uuid, id: u64) {
        let mut guard = self.subscribers.write();
        let emptied = match guard.get_mut(&channel_id) {
            Some(subs) => {
                subs.remove(&id);
                subs.is_empty()
            }
            None => false,
        };
        if emptied {
            guard.remove(&channel_id);
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live, bounded-buffer binding of one consumer to one hub channel.
pub struct ChannelSubscription {
    hub: Arc<Hub>,
    channel_id: Uuid,
    id: u64,
    receiver: mpsc::Receiver<ChannelEvent>,
}

impl ChannelSubscription {
    /// Next event, or `None` once the queue is closed.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking variant used by tests and drain paths.
    pub fn try_recv(&mut self) -> Option<ChannelEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for ChannelSubscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.channel_id, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str, channel_id: Uuid) -> ChannelEvent {
        ChannelEvent::MessageCreated(MessageCreated {
            id: Uuid::now_v7(),
            channel_id,
            author_id: Uuid::now_v7(),
            author_username: Some("alice".into()),
            author_avatar_url: None,
            content: content.into(),
            created_at: Utc::now(),
            edited_at: None,
        })
    }

    fn content_of(event: &ChannelEvent) -> &str {
        match event {
            ChannelEvent::MessageCreated(m) => &m.content,
            ChannelEvent::MessageDeleted(_) => "",
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = Arc::new(Hub::new());
        let channel = Uuid::now_v7();

        let mut a = hub.subscribe(channel);
        let mut b = hub.subscribe(channel);

        hub.publish(channel, &event("hi", channel));

        assert_eq!(content_of(&a.recv().await.unwrap()), "hi");
        assert_eq!(content_of(&b.recv().await.unwrap()), "hi");
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = Arc::new(Hub::new());
        let channel = Uuid::now_v7();
        let mut sub = hub.subscribe(channel);

        for i in 0..10 {
            hub.publish(channel, &event(&format!("m{i}"), channel));
        }

        for i in 0..10 {
            assert_eq!(content_of(&sub.recv().await.unwrap()), format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn publish_does_not_cross_channels() {
        let hub = Arc::new(Hub::new());
        let channel_a = Uuid::now_v7();
        let channel_b = Uuid::now_v7();

        let mut sub_b = hub.subscribe(channel_b);
        hub.publish(channel_a, &event("only-a", channel_a));

        assert!(sub_b.try_recv().is_none());
    }

    #[tokio::test]
    async fn slow_subscriber_drops_alone() {
        let hub = Arc::new(Hub::new());
        let channel = Uuid::now_v7();

        let mut slow = hub.subscribe(channel);
        let mut fast = hub.subscribe(channel);

        // Fill both queues, then drain only the fast one.
        for i in 0..SUBSCRIBER_QUEUE_CAPACITY {
            hub.publish(channel, &event(&format!("fill{i}"), channel));
        }
        while fast.try_recv().is_some() {}

        // The slow queue is full: this event is dropped for it alone.
        hub.publish(channel, &event("latest", channel));

        assert_eq!(content_of(&fast.recv().await.unwrap()), "latest");

        let mut slow_seen = Vec::new();
        while let Some(ev) = slow.try_recv() {
            slow_seen.push(content_of(&ev).to_string());
        }
        assert_eq!(slow_seen.len(), SUBSCRIBER_QUEUE_CAPACITY);
        assert!(!slow_seen.contains(&"latest".to_string()));

        // Both queues stay open after the drop.
        hub.publish(channel, &event("after", channel));
        assert_eq!(content_of(&slow.recv().await.unwrap()), "after");
        assert_eq!(content_of(&fast.recv().await.unwrap()), "after");
    }

    #[tokio::test]
    async fn drop_unsubscribes_and_prunes_channel() {
        let hub = Arc::new(Hub::new());
        let channel = Uuid::now_v7();

        let a = hub.subscribe(channel);
        let b = hub.subscribe(channel);
        assert_eq!(hub.subscriber_count(channel), 2);

        drop(a);
        assert_eq!(hub.subscriber_count(channel), 1);

        drop(b);
        assert_eq!(hub.subscriber_count(channel), 0);
        assert!(hub.subscribers.read().is_empty());
    }

    #[tokio::test]
    async fn publish_to_empty_channel_is_a_noop() {
        let hub = Arc::new(Hub::new());
        let channel = Uuid::now_v7();
        hub.publish(channel, &event("nobody", channel));
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let channel = Uuid::now_v7();
        let json = serde_json::to_value(event("hi", channel)).unwrap();
        assert_eq!(json["type"], "message_created");
        assert_eq!(json["data"]["content"], "hi");

        let deleted = ChannelEvent::MessageDeleted(MessageDeleted {
            message_id: Uuid::now_v7(),
            channel_id: channel,
        });
        let json = serde_json::to_value(deleted).unwrap();
        assert_eq!(json["type"], "message_deleted");
    }
}
