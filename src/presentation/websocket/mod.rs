//! Channel Subscribe Stream
//!
//! Server-streaming delivery of channel events over a WebSocket. The
//! subscription lifecycle is tied to the peer: the relay ends when the peer
//! disconnects, when the queue is closed, or when the server shuts the task
//! down. Dropping the subscription deregisters it from the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use crate::infrastructure::hub::ChannelSubscription;
use crate::infrastructure::metrics;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Upgrade handler for `GET /api/v1/channels/:channel_id/subscribe`.
///
/// Authorization happens before the upgrade: non-members receive a plain
/// 403 instead of a socket.
pub async fn subscribe_channel(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.chat.can_subscribe(channel_id, auth.user_id).await?;

    let subscription = state.hub.subscribe(channel_id);
    let user_id = auth.user_id;

    Ok(ws.on_upgrade(move |socket| relay_events(socket, subscription, channel_id, user_id)))
}

/// Two-way select between the subscriber's event queue and the peer socket.
async fn relay_events(
    socket: WebSocket,
    mut subscription: ChannelSubscription,
    channel_id: Uuid,
    user_id: Uuid,
) {
    metrics::ACTIVE_SUBSCRIPTIONS.inc();
    tracing::debug!(channel_id = %channel_id, user_id = %user_id, "stream subscription opened");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to serialize channel event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break; // peer went away mid-send
                    }
                }
                None => break, // queue closed
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients only ever consume on this socket; ignore pings and
                // stray frames.
                _ => {}
            },
        }
    }

    metrics::ACTIVE_SUBSCRIPTIONS.dec();
    tracing::debug!(channel_id = %channel_id, user_id = %user_id, "stream subscription closed");
}
