//! Application Startup
//!
//! Composition root: builds the dependency graph (store -> repositories ->
//! services -> transport), owns the process-wide singletons, and runs the
//! listener until a termination signal drains it.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthService, ChatService, GuildService, TokenService, UserService,
};
use crate::config::Settings;
use crate::infrastructure::cache::CacheProvider;
use crate::infrastructure::database;
use crate::infrastructure::hub::Hub;
use crate::infrastructure::repositories::{
    PgChannelRepository, PgGuildRepository, PgInviteRepository, PgMemberRepository,
    PgMessageRepository, PgUserRepository,
};
use crate::presentation::http::routes;

pub type AppAuthService = AuthService<PgUserRepository>;
pub type AppUserService = UserService<PgUserRepository>;
pub type AppGuildService =
    GuildService<PgGuildRepository, PgChannelRepository, PgMemberRepository, PgInviteRepository>;
pub type AppChatService = ChatService<PgMessageRepository, PgChannelRepository, PgMemberRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
    pub hub: Arc<Hub>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AppAuthService>,
    pub users: Arc<AppUserService>,
    pub guilds: Arc<AppGuildService>,
    pub chat: Arc<AppChatService>,
}

impl AppState {
    /// Wire repositories and services over the given pool and cache.
    pub fn new(settings: Arc<Settings>, db: PgPool, cache_provider: Arc<CacheProvider>) -> Self {
        let hub = Arc::new(Hub::new());
        let tokens = Arc::new(TokenService::new(&settings.auth, &settings.realm_id));

        let user_repo = Arc::new(PgUserRepository::new(db.clone()));
        let guild_repo = Arc::new(PgGuildRepository::new(db.clone()));
        let channel_repo = Arc::new(PgChannelRepository::new(db.clone()));
        let member_repo = Arc::new(PgMemberRepository::new(db.clone()));
        let invite_repo = Arc::new(PgInviteRepository::new(db.clone()));
        let message_repo = Arc::new(PgMessageRepository::new(db.clone()));

        let auth = Arc::new(AuthService::new(Arc::clone(&user_repo), Arc::clone(&tokens)));
        let users = Arc::new(UserService::new(Arc::clone(&user_repo), cache_provider));
        let guilds = Arc::new(GuildService::new(
            guild_repo,
            Arc::clone(&channel_repo),
            Arc::clone(&member_repo),
            invite_repo,
        ));
        let chat = Arc::new(ChatService::new(
            message_repo,
            channel_repo,
            member_repo,
            Arc::clone(&hub),
        ));

        Self {
            db,
            settings,
            hub,
            tokens,
            auth,
            users,
            guilds,
            chat,
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    db: PgPool,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("database migrations applied");

        let cache_provider = Arc::new(
            CacheProvider::connect(&settings.cache, &settings.redis)
                .await
                .map_err(|e| anyhow::anyhow!("cache init: {e}"))?,
        );

        let addr = settings.server_addr();
        let state = AppState::new(Arc::new(settings), db.clone(), cache_provider);
        let router = routes::create_router(state);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            db,
        })
    }

    /// Serve until a termination signal, then drain and release resources.
    ///
    /// New connections stop being accepted on the signal; in-flight unary
    /// calls complete, stream tasks end with the server, and the store pool
    /// closes last.
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.db.close().await;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
