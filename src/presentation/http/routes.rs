//! Route Configuration
//!
//! Wires the API surface and the request pipeline. Middleware runs outer to
//! inner: recover -> request-id -> log; auth is a route layer on the
//! protected groups, leaving register/login/refresh public.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, log_requests, recover_middleware, request_id_middleware,
};
use crate::presentation::websocket::subscribe_channel;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health probe
        .route("/health", get(handlers::health::health_check))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        // Pipeline, inner to outer: log <- request-id <- recover
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(recover_middleware))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics::gather_metrics(),
    )
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes(state.clone()))
        .nest("/guilds", guild_routes(state.clone()))
        .nest("/invites", invite_routes(state.clone()))
        .nest("/channels", channel_routes(state))
}

/// Public routes: no bearer required.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/@me",
            get(handlers::user::get_current_user)
                .patch(handlers::user::update_current_user)
                .delete(handlers::user::delete_current_user),
        )
        .route("/", get(handlers::user::search_users))
        .route("/:user_id", get(handlers::user::get_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn guild_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::guild::create_guild).get(handlers::guild::list_my_guilds),
        )
        .route(
            "/:guild_id",
            get(handlers::guild::get_guild).delete(handlers::guild::delete_guild),
        )
        .route(
            "/:guild_id/channels",
            get(handlers::guild::get_guild_channels).post(handlers::guild::create_channel),
        )
        .route("/:guild_id/members", get(handlers::guild::get_guild_members))
        .route("/:guild_id/invites", post(handlers::guild::create_invite))
        .route("/:guild_id/leave", post(handlers::guild::leave_guild))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn invite_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:code/join", post(handlers::guild::join_by_invite))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn channel_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:channel_id", delete(handlers::channel::delete_channel))
        .route(
            "/:channel_id/messages",
            get(handlers::channel::get_messages).post(handlers::channel::send_message),
        )
        .route(
            "/:channel_id/messages/:message_id",
            delete(handlers::channel::delete_message),
        )
        // Server-streaming subscription
        .route("/:channel_id/subscribe", get(subscribe_channel))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
